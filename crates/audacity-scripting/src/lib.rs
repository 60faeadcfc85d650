//! # audacity-scripting
//!
//! Editing operations built from mod-script-pipe commands: selecting,
//! joining and splitting clips, per-label normalization and compression,
//! gain changes and mix-downs.
//!
//! ## Architecture
//!
//! ```text
//! scripts::*  ──>  AudacityScripting  ──>  Session  ──>  pipes  ──>  Audacity
//!                        │
//!                        └── audio_tracks(): tracks + labels -> clip spans
//! ```

pub mod audio_tracks;
pub mod scripting;
pub mod scripts;
pub mod settings;

pub use audio_tracks::{AudioTrack, ClipSpan, audio_tracks, gain_to_db};
pub use scripting::AudacityScripting;
pub use settings::{CompressorSettings, NormalizeSettings};

#[cfg(all(test, unix))]
mod test_support;
