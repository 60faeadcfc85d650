//! Batch scripts composed from the editing operations

use crate::scripting::AudacityScripting;
use crate::settings::NormalizeSettings;
use audacity_core::Result;
use tracing::{info, warn};

/// Join all clips on all tracks
pub async fn join_clips(scripting: &mut AudacityScripting) -> Result<()> {
    info!("Running Script: Join All Clips");
    scripting.join_all_clips().await
}

/// Normalize the named tracks one label span at a time
pub async fn normalize_tracks<S: AsRef<str>>(
    scripting: &mut AudacityScripting,
    track_names: &[S],
    settings: NormalizeSettings,
) -> Result<()> {
    info!("Running Script: Normalize Tracks");
    scripting
        .normalize_tracks_by_label(track_names, settings)
        .await
}

/// Name given to a mix of `tracks` rendered at `gains`.
///
/// Gains always show a decimal point, so `0` reads `0.0`.
pub fn mix_name(tracks: [&str; 2], gains: (f64, f64)) -> String {
    format!("{}: {:?} {}: {:?}", tracks[0], gains.0, tracks[1], gains.1)
}

/// Render one mix of two tracks per gain pair.
///
/// Each mix lands on a new track named by [`mix_name`]. The tracks' starting
/// gains are restored afterwards, including when a step fails. Returns the
/// names of the new tracks.
pub async fn mix_and_render(
    scripting: &mut AudacityScripting,
    tracks: [&str; 2],
    gain_pairs: &[(f64, f64)],
) -> Result<Vec<String>> {
    info!("Running Script: Mix and Render Tracks");

    let starting = (
        scripting.get_track_gain(tracks[0]).await?,
        scripting.get_track_gain(tracks[1]).await?,
    );

    let result = render_mixes(scripting, tracks, gain_pairs).await;

    let restored = restore_gains(scripting, tracks, starting).await;
    if let (Err(e), Err(_)) = (&restored, &result) {
        warn!("Could not restore starting gains: {}", e);
    }

    let names = result?;
    restored?;
    Ok(names)
}

async fn render_mixes(
    scripting: &mut AudacityScripting,
    tracks: [&str; 2],
    gain_pairs: &[(f64, f64)],
) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(gain_pairs.len());

    for &gains in gain_pairs {
        scripting.set_track_gain(tracks[0], gains.0).await?;
        scripting.set_track_gain(tracks[1], gains.1).await?;
        scripting.mix_and_render_to_new_track(&tracks).await?;

        let new_track_num = scripting.tracks().await?.len().saturating_sub(1);
        let name = mix_name(tracks, gains);
        scripting.rename_track_by_num(&name, new_track_num).await?;
        info!("Rendered {:?} as track {}", name, new_track_num);
        names.push(name);
    }

    Ok(names)
}

async fn restore_gains(
    scripting: &mut AudacityScripting,
    tracks: [&str; 2],
    gains: (f64, f64),
) -> Result<()> {
    scripting.set_track_gain(tracks[0], gains.0).await?;
    scripting.set_track_gain(tracks[1], gains.1).await
}
