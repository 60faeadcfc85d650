//! Error types for the scripting pipe

use std::time::Duration;
use thiserror::Error;

/// Guidance attached to the missing-endpoint errors
pub const PIPE_HINT: &str = "Ensure Audacity is running with mod-script-pipe.";

/// Result type for scripting operations
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Scripting pipe error types
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The command endpoint (client -> Audacity) does not exist
    #[error("{0} ..does not exist. {hint}", hint = PIPE_HINT)]
    ToChannelNotExist(String),

    /// The response endpoint (Audacity -> client) does not exist
    #[error("{0} ..does not exist. {hint}", hint = PIPE_HINT)]
    FromChannelNotExist(String),

    /// Endpoint exists but every instance is held by another client
    #[error("{0} is busy. Close other scripting clients and retry.")]
    PipeBusy(String),

    /// Status line was not the success sentinel
    #[error("Command finished with the status: {0}")]
    CommandFailed(String),

    /// Payload was not valid JSON after the escaping fix-up
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// IPC communication error
    #[error("IPC error: {0}")]
    IpcError(String),

    /// Peer closed its end before a response was complete
    #[error("Connection closed by Audacity")]
    ConnectionClosed,

    /// No complete response within the deadline
    #[error("No response within {0:?}")]
    Timeout(Duration),

    /// An earlier exchange was abandoned mid-response
    #[error("Session desynchronized by an abandoned response; reopen the pipes")]
    Desynchronized,

    /// No wave track with the requested name
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// JSON was valid but not shaped as expected
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),
}

impl ScriptError {
    /// Whether the host replied and reported failure, as opposed to a transport problem
    pub fn is_command_failure(&self) -> bool {
        matches!(self, ScriptError::CommandFailed(_))
    }
}
