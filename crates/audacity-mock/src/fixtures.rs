//! Canned `GetInfo:` payloads
//!
//! Payloads are stored exactly as Audacity prints them, including the
//! unescaped backslashes in Windows paths.

use audacity_core::InfoType;

const COMMANDS: &str = include_str!("../fixtures/commands.txt");
const MENUS: &str = include_str!("../fixtures/menus.txt");
const PREFERENCES: &str = include_str!("../fixtures/preferences.txt");
const TRACKS: &str = include_str!("../fixtures/tracks.txt");
const CLIPS: &str = include_str!("../fixtures/clips.txt");
const ENVELOPES: &str = include_str!("../fixtures/envelopes.txt");
const LABELS: &str = include_str!("../fixtures/labels.txt");
const BOXES: &str = include_str!("../fixtures/boxes.txt");
const SCRIPTING_IDS: &str = include_str!("../fixtures/scripting_ids.txt");

/// Payload for `info_type`, newline terminated
pub fn fixture(info_type: InfoType) -> &'static str {
    match info_type {
        InfoType::Commands => COMMANDS,
        InfoType::Menus => MENUS,
        InfoType::Preferences => PREFERENCES,
        InfoType::Tracks => TRACKS,
        InfoType::Clips => CLIPS,
        InfoType::Envelopes => ENVELOPES,
        InfoType::Labels => LABELS,
        InfoType::Boxes => BOXES,
    }
}

/// Lowercase scripting ids the mock accepts
pub fn scripting_ids() -> impl Iterator<Item = &'static str> {
    SCRIPTING_IDS.lines().map(str::trim).filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_fixture_is_newline_terminated() {
        for info_type in InfoType::ALL {
            let payload = fixture(info_type);
            assert!(payload.starts_with('['), "{info_type} fixture");
            assert!(payload.ends_with(" ]\n"), "{info_type} fixture");
        }
    }

    #[test]
    fn test_every_fixture_decodes() {
        use audacity_core::RawResponse;

        for info_type in InfoType::ALL {
            let response = RawResponse::new(format!("{}BatchCommand finished: OK\n", fixture(info_type)));
            let value = response
                .json()
                .unwrap_or_else(|e| panic!("{info_type} fixture: {e}"));
            assert!(value.is_array());
        }
    }

    #[test]
    fn test_menus_keep_raw_paths() {
        assert!(fixture(InfoType::Menus).contains(r"C:\Users\"));
    }

    #[test]
    fn test_scripting_ids_are_lowercase() {
        let ids: Vec<_> = scripting_ids().collect();
        assert_eq!(ids.len(), 293);
        assert!(ids.iter().all(|id| *id == id.to_lowercase()));
        assert!(ids.contains(&"selectall"));
        assert!(ids.contains(&"mixandrendertonewtrack"));
    }
}
