//! # audacity-mock
//!
//! A scripted replacement for Audacity's mod-script-pipe server, used to
//! exercise clients without a running editor.
//!
//! The mock creates the same endpoints the real module does, answers a
//! fixed set of scripting ids, and serves canned `GetInfo:` payloads
//! recorded from a real session.

pub mod fixtures;
pub mod responder;
pub mod server;

pub use responder::{
    MISSING_COLON_RESPONSE, Responder, SUCCESS_RESPONSE, bad_command_response,
};
pub use server::{MockServer, MockState};
