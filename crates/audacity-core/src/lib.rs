//! # audacity-core
//!
//! Core types for driving Audacity through mod-script-pipe.
//!
//! This crate provides the transport-independent pieces of the protocol:
//! - Endpoint naming and line-ending conventions
//! - Command rendering
//! - Status-line validation and JSON payload decoding
//! - `GetInfo:` categories and typed payloads
//! - Error types

pub mod command;
pub mod endpoint;
pub mod error;
pub mod info;
pub mod response;

pub use command::Command;
pub use endpoint::{EndpointPair, LineEnding};
pub use error::{Result, ScriptError};
pub use info::{ClipInfo, InfoType, Label, LabelTrack, TrackInfo};
pub use response::{RawResponse, SUCCESS_SENTINEL, fix_escaping};
