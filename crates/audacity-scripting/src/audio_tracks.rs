//! Audio tracks and their label-delimited spans
//!
//! Labels mark points of interest across the whole project. Each wave track
//! is cut into spans at the midpoint of every label on the first label track,
//! so that effects can be applied span by span.

use audacity_core::{LabelTrack, Result, ScriptError, TrackInfo};
use serde::Serialize;

/// A time range on one track, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipSpan {
    pub start: f64,
    pub end: f64,
}

/// A wave track with its gain and spans
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioTrack {
    /// Index among all tracks, as used by `SelectTracks: Track=`
    pub track_num: usize,
    pub name: String,
    /// Rounded to whole dB
    pub gain: f64,
    pub clips: Vec<ClipSpan>,
}

/// Linear voltage ratio to whole decibels
pub fn gain_to_db(ratio: f64) -> f64 {
    (20.0 * ratio.log10()).round()
}

/// Wave tracks of `tracks`, optionally restricted to the names in `filter`.
///
/// Without a label track every audio track gets one span from its start
/// to its end.
pub fn audio_tracks<S: AsRef<str>>(
    tracks: &[TrackInfo],
    labels: &[LabelTrack],
    filter: Option<&[S]>,
) -> Result<Vec<AudioTrack>> {
    let midpoints: Vec<f64> = labels
        .first()
        .map(|track| track.labels.iter().map(|label| label.midpoint()).collect())
        .unwrap_or_default();

    let mut audio = Vec::new();
    for (track_num, track) in tracks.iter().enumerate() {
        if !track.is_wave() {
            continue;
        }
        if let Some(names) = filter {
            if !names.iter().any(|name| name.as_ref() == track.name) {
                continue;
            }
        }

        let (start, end, gain) = match (track.start, track.end, track.gain) {
            (Some(start), Some(end), Some(gain)) => (start, end, gain),
            _ => {
                return Err(ScriptError::UnexpectedPayload(format!(
                    "Wave track {:?} has no start, end or gain",
                    track.name
                )));
            }
        };

        let mut boundaries = Vec::with_capacity(midpoints.len() + 2);
        boundaries.push(start);
        boundaries.extend_from_slice(&midpoints);
        boundaries.push(end);

        let clips = boundaries
            .windows(2)
            .map(|pair| ClipSpan {
                start: pair[0],
                end: pair[1],
            })
            .collect();

        audio.push(AudioTrack {
            track_num,
            name: track.name.clone(),
            gain: gain_to_db(gain),
            clips,
        });
    }

    Ok(audio)
}
