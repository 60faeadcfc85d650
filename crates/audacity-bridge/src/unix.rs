//! FIFO transport for Linux and macOS
//!
//! mod-script-pipe creates `audacity_script_pipe.{to,from}.<uid>` in `/tmp`.
//! Opening a FIFO blocks until the other side opens it too, so the opens run
//! on the blocking pool before the handles are handed to tokio.

use crate::transport::{EndpointResolver, Transport};
use async_trait::async_trait;
use audacity_core::endpoint::DEFAULT_FIFO_DIR;
use audacity_core::{EndpointPair, LineEnding, Result, ScriptError};
use std::fs::{File, OpenOptions};
use std::path::Path;
use tokio::net::unix::pipe;
use tracing::info;

/// Resolves the per-user FIFO pair
#[derive(Debug, Clone)]
pub struct FifoResolver {
    endpoints: EndpointPair,
}

impl FifoResolver {
    /// FIFOs for the current user in `/tmp`
    pub fn new() -> Self {
        Self::in_dir(DEFAULT_FIFO_DIR)
    }

    /// FIFOs for the current user in `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::with_endpoints(EndpointPair::fifo_for_current_user(dir))
    }

    pub fn with_endpoints(endpoints: EndpointPair) -> Self {
        Self { endpoints }
    }
}

impl Default for FifoResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointResolver for FifoResolver {
    fn endpoints(&self) -> &EndpointPair {
        &self.endpoints
    }

    fn line_ending(&self) -> LineEnding {
        LineEnding::Lf
    }

    async fn connect(&self) -> Result<Transport> {
        let to_path = self.endpoints.to_host.clone();
        let from_path = self.endpoints.from_host.clone();

        info!("Write to {:?}", to_path);
        if !to_path.exists() {
            return Err(ScriptError::ToChannelNotExist(
                to_path.display().to_string(),
            ));
        }

        info!("Read from {:?}", from_path);
        if !from_path.exists() {
            return Err(ScriptError::FromChannelNotExist(
                from_path.display().to_string(),
            ));
        }

        info!("Both pipes exist");

        // Same order as the host: command pipe first, then response pipe
        let (to_file, from_file) = tokio::task::spawn_blocking(move || -> Result<(File, File)> {
            let to_file = OpenOptions::new()
                .write(true)
                .open(&to_path)
                .map_err(|e| {
                    ScriptError::IpcError(format!("Failed to open {:?}: {}", to_path, e))
                })?;
            info!("Command pipe opened");

            let from_file = File::open(&from_path).map_err(|e| {
                ScriptError::IpcError(format!("Failed to open {:?}: {}", from_path, e))
            })?;
            info!("Response pipe opened");

            Ok((to_file, from_file))
        })
        .await
        .map_err(|e| ScriptError::IpcError(format!("Pipe open task failed: {}", e)))??;

        let sender = pipe::Sender::from_file(to_file)
            .map_err(|e| ScriptError::IpcError(format!("Command pipe is not a FIFO: {}", e)))?;
        let receiver = pipe::Receiver::from_file(from_file)
            .map_err(|e| ScriptError::IpcError(format!("Response pipe is not a FIFO: {}", e)))?;

        Ok(Transport::from_streams(receiver, sender, LineEnding::Lf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_to_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FifoResolver::with_endpoints(EndpointPair::fifo(dir.path(), 42));

        match resolver.connect().await {
            Err(ScriptError::ToChannelNotExist(path)) => {
                assert!(path.ends_with("audacity_script_pipe.to.42"))
            }
            Err(e) => panic!("Expected ToChannelNotExist, got {}", e),
            Ok(_) => panic!("Expected ToChannelNotExist, got a transport"),
        }
    }

    #[tokio::test]
    async fn test_missing_from_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let pair = EndpointPair::fifo(dir.path(), 42);
        std::fs::write(&pair.to_host, b"").unwrap();
        let resolver = FifoResolver::with_endpoints(pair);

        match resolver.connect().await {
            Err(ScriptError::FromChannelNotExist(path)) => {
                assert!(path.ends_with("audacity_script_pipe.from.42"))
            }
            Err(e) => panic!("Expected FromChannelNotExist, got {}", e),
            Ok(_) => panic!("Expected FromChannelNotExist, got a transport"),
        }
    }

    #[test]
    fn test_default_dir_is_tmp() {
        let resolver = FifoResolver::new();
        assert!(resolver.endpoints().to_host.starts_with("/tmp"));
        assert_eq!(resolver.line_ending(), LineEnding::Lf);
    }
}
