//! Scripting command builder
//!
//! Renders the `Identifier: Key1=Value1 Key2="Value2"` grammar understood by
//! mod-script-pipe. The pipe itself never parses commands; validity is only
//! known from the host's status line.

use std::fmt;

/// A single scripting command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    id: String,
    args: Vec<(String, String)>,
}

impl Command {
    /// Command with no arguments, e.g. `SelectAll:`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: Vec::new(),
        }
    }

    /// Add a bare `Key=Value` argument
    pub fn arg(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.args.push((key.into(), value.to_string()));
        self
    }

    /// Add a `Key="Value"` argument, for values that may contain spaces
    pub fn quoted(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.args.push((key.into(), format!("\"{}\"", value)));
        self
    }

    /// Add a boolean argument rendered as `True`/`False`
    pub fn flag(self, key: impl Into<String>, value: bool) -> Self {
        self.arg(key, if value { "True" } else { "False" })
    }

    /// Scripting identifier
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.id)?;
        for (key, value) in &self.args {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.to_string()
    }
}
