//! Raw responses, status validation and JSON payload decoding
//!
//! Every reply from mod-script-pipe is zero or more payload lines, a status
//! line and a terminating blank line. The channel consumes the blank line, so
//! a [`RawResponse`] always ends with `"<status>\n"`.

use crate::error::{Result, ScriptError};
use serde::de::DeserializeOwned;

/// Status line reported for a successful command
pub const SUCCESS_SENTINEL: &str = "BatchCommand finished: OK";

/// Accumulated text of one reply, status line included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse(String);

impl RawResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The line preceding the trailing newline; empty if there is none
    pub fn status_line(&self) -> &str {
        let lines: Vec<&str> = self.0.split('\n').collect();
        if lines.len() < 2 {
            return "";
        }
        lines[lines.len() - 2]
    }

    pub fn is_success(&self) -> bool {
        self.status_line() == SUCCESS_SENTINEL
    }

    /// Fail with [`ScriptError::CommandFailed`] unless the status line is the sentinel
    pub fn validate(&self) -> Result<()> {
        let status = self.status_line();
        if status == SUCCESS_SENTINEL {
            Ok(())
        } else {
            Err(ScriptError::CommandFailed(status.to_string()))
        }
    }

    /// Payload text with the escaping fix-up applied, ready for a JSON parser
    pub fn payload(&self) -> String {
        let lines: Vec<&str> = self.0.split('\n').collect();
        let keep = lines.len().saturating_sub(2);
        lines[..keep]
            .iter()
            .map(|line| fix_escaping(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Decode the payload as untyped JSON
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.payload())?)
    }

    /// Decode the payload into `T`
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.payload())?)
    }
}

impl AsRef<str> for RawResponse {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for RawResponse {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Repair backslash escaping in one payload line.
///
/// Audacity writes file paths with single backslashes but escapes embedded
/// quotes as `\"`. Doubling every backslash makes paths valid JSON; collapsing
/// `\\"` back to `\"` restores the quotes. The order matters.
pub fn fix_escaping(line: &str) -> String {
    line.replace('\\', "\\\\").replace("\\\\\"", "\\\"")
}
