//! Endpoint naming for the two scripting pipes
//!
//! mod-script-pipe exposes one pipe per direction. On Windows these are fixed
//! named pipes; elsewhere they are FIFOs in a temp directory suffixed with the
//! numeric user id so that each user gets their own pair.

use std::fmt;
use std::path::{Path, PathBuf};

/// Default directory holding the FIFOs on unix
pub const DEFAULT_FIFO_DIR: &str = "/tmp";

/// Windows pipe the client writes commands to
pub const WINDOWS_TO_PIPE: &str = r"\\.\pipe\ToSrvPipe";

/// Windows pipe the client reads responses from
pub const WINDOWS_FROM_PIPE: &str = r"\\.\pipe\FromSrvPipe";

const FIFO_TO_PREFIX: &str = "audacity_script_pipe.to.";
const FIFO_FROM_PREFIX: &str = "audacity_script_pipe.from.";

/// Terminator appended to every outbound command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n\0`, expected by the Windows pipe server
    CrLfNul,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLfNul => "\r\n\0",
        }
    }
}

/// The pair of endpoints for one client/host conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPair {
    /// Client writes, host reads
    pub to_host: PathBuf,
    /// Host writes, client reads
    pub from_host: PathBuf,
}

impl EndpointPair {
    /// FIFO pair for `uid` inside `dir`
    pub fn fifo(dir: impl AsRef<Path>, uid: u32) -> Self {
        let dir = dir.as_ref();
        Self {
            to_host: dir.join(format!("{FIFO_TO_PREFIX}{uid}")),
            from_host: dir.join(format!("{FIFO_FROM_PREFIX}{uid}")),
        }
    }

    /// FIFO pair for the current user inside `dir`
    #[cfg(unix)]
    pub fn fifo_for_current_user(dir: impl AsRef<Path>) -> Self {
        Self::fifo(dir, current_uid())
    }

    /// The fixed Windows named pipes
    pub fn named_pipes() -> Self {
        Self {
            to_host: PathBuf::from(WINDOWS_TO_PIPE),
            from_host: PathBuf::from(WINDOWS_FROM_PIPE),
        }
    }
}

impl fmt::Display for EndpointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.to_host.display(),
            self.from_host.display()
        )
    }
}

/// Numeric id of the user running this process
#[cfg(unix)]
pub fn current_uid() -> u32 {
    nix::unistd::getuid().as_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_names_embed_uid() {
        let pair = EndpointPair::fifo("/tmp", 1000);
        assert_eq!(
            pair.to_host,
            PathBuf::from("/tmp/audacity_script_pipe.to.1000")
        );
        assert_eq!(
            pair.from_host,
            PathBuf::from("/tmp/audacity_script_pipe.from.1000")
        );
    }

    #[test]
    fn test_named_pipes_are_fixed() {
        let pair = EndpointPair::named_pipes();
        assert_eq!(pair.to_host.to_string_lossy(), r"\\.\pipe\ToSrvPipe");
        assert_eq!(pair.from_host.to_string_lossy(), r"\\.\pipe\FromSrvPipe");
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(LineEnding::Lf.as_str(), "\n");
        assert_eq!(LineEnding::CrLfNul.as_str(), "\r\n\0");
    }
}
