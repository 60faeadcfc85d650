//! Command evaluation for the mock
//!
//! Replies mirror what mod-script-pipe prints, terminating blank line
//! included, so a client sees the same framing it would from Audacity.

use crate::fixtures::{fixture, scripting_ids};
use audacity_core::InfoType;
use std::collections::HashSet;
use tracing::debug;

/// Reply to any accepted command
pub const SUCCESS_RESPONSE: &str = "BatchCommand finished: OK\n";

/// Reply to a command with no `:` separator
pub const MISSING_COLON_RESPONSE: &str = "Syntax error!\nCommand is missing ':'\n";

/// Reply to an unknown scripting id
pub fn bad_command_response(scripting_id: &str) -> String {
    format!(
        "Your batch command of {} was not recognized.\nBatchCommand finished: Failed!\n",
        scripting_id
    )
}

/// Evaluates one command line at a time.
///
/// Remembers the last `GetInfo:` category so that a query with an unknown
/// or missing type repeats the previous payload.
#[derive(Debug, Clone)]
pub struct Responder {
    known_ids: HashSet<&'static str>,
    last_info: InfoType,
}

impl Responder {
    pub fn new() -> Self {
        Self {
            known_ids: scripting_ids().collect(),
            last_info: InfoType::default(),
        }
    }

    /// Category the next untyped `GetInfo:` will return
    pub fn last_info(&self) -> InfoType {
        self.last_info
    }

    /// Full reply for `command`, ending with the blank line
    pub fn respond(&mut self, command: &str) -> String {
        let command = command.trim_matches(|c| matches!(c, '\r' | '\n' | '\0'));
        let parts: Vec<&str> = command.split(':').collect();
        let scripting_id = parts[0].trim().to_lowercase();
        debug!("scripting id: {:?}", scripting_id);

        let mut response = if scripting_id == "getinfo" {
            let args = parts[1..].join(" ");
            let info_type = self.requested_type(&args);
            format!("{}{}", fixture(info_type), SUCCESS_RESPONSE)
        } else if self.known_ids.contains(scripting_id.as_str()) {
            SUCCESS_RESPONSE.to_string()
        } else if parts.len() == 1 && scripting_id.contains(char::is_whitespace) {
            MISSING_COLON_RESPONSE.to_string()
        } else {
            bad_command_response(&scripting_id)
        };

        response.push('\n');
        response
    }

    fn requested_type(&mut self, args: &str) -> InfoType {
        // ASCII lowering keeps byte offsets valid for slicing `args`
        let lowered = args.to_ascii_lowercase();
        let Some(pos) = lowered.rfind("type=") else {
            return self.last_info;
        };

        let token = args[pos + "type=".len()..]
            .split_whitespace()
            .next()
            .unwrap_or("");

        match token.parse::<InfoType>() {
            Ok(info_type) => {
                self.last_info = info_type;
                info_type
            }
            Err(_) => {
                debug!("Unknown info type {:?}, repeating {}", token, self.last_info);
                self.last_info
            }
        }
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_id_succeeds() {
        let mut responder = Responder::new();
        assert_eq!(responder.respond("SelectAll:\n"), "BatchCommand finished: OK\n\n");
        assert_eq!(responder.respond("Join:\r\n\0"), "BatchCommand finished: OK\n\n");
    }

    #[test]
    fn test_arguments_are_ignored_for_known_ids() {
        let mut responder = Responder::new();
        let reply = responder.respond("SetTrackStatus: Name=\"New Track Name\"\n");
        assert_eq!(reply, "BatchCommand finished: OK\n\n");
    }

    #[test]
    fn test_unknown_id_fails() {
        let mut responder = Responder::new();
        assert_eq!(
            responder.respond("Bogus:\n"),
            "Your batch command of bogus was not recognized.\nBatchCommand finished: Failed!\n\n"
        );
    }

    #[test]
    fn test_missing_colon() {
        let mut responder = Responder::new();
        assert_eq!(
            responder.respond("Select All\n"),
            "Syntax error!\nCommand is missing ':'\n\n"
        );
        // Without whitespace the line is taken as a bare id
        assert_eq!(
            responder.respond("SelectAll\n"),
            format!("{}\n", SUCCESS_RESPONSE)
        );
        assert_eq!(
            responder.respond("NotACommand\n"),
            format!("{}\n", bad_command_response("notacommand"))
        );
    }

    #[test]
    fn test_getinfo_by_type() {
        let mut responder = Responder::new();
        let reply = responder.respond("GetInfo: Type=Tracks\n");
        assert!(reply.starts_with(fixture(InfoType::Tracks)));
        assert!(reply.ends_with("BatchCommand finished: OK\n\n"));
        assert_eq!(responder.last_info(), InfoType::Tracks);
    }

    #[test]
    fn test_getinfo_type_is_case_insensitive() {
        let mut responder = Responder::new();
        let reply = responder.respond("getinfo: TYPE=labels Format=JSON\n");
        assert!(reply.starts_with(fixture(InfoType::Labels)));
    }

    #[test]
    fn test_getinfo_defaults_to_commands() {
        let mut responder = Responder::new();
        assert!(responder.respond("GetInfo:\n").starts_with(fixture(InfoType::Commands)));
    }

    #[test]
    fn test_getinfo_repeats_last_type() {
        let mut responder = Responder::new();
        responder.respond("GetInfo: Type=Labels\n");

        assert!(responder.respond("GetInfo:\n").starts_with(fixture(InfoType::Labels)));
        assert!(
            responder
                .respond("GetInfo: Type=Nonsense\n")
                .starts_with(fixture(InfoType::Labels))
        );
    }
}
