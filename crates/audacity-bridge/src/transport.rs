//! Transport abstractions for the scripting pipes
//!
//! Provides AsyncReader/AsyncWriter traits over the two one-directional
//! endpoints, and the EndpointResolver trait that opens them for a platform
//! (FIFOs on unix, named pipes on Windows).

use async_trait::async_trait;
use audacity_core::{EndpointPair, LineEnding, Result, ScriptError};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Trait for reading from the host's response endpoint
#[async_trait]
pub trait AsyncReader: Send {
    /// Append one line, including its newline, to `buf`.
    /// Returns the number of bytes read; 0 means the host closed its end.
    async fn read_line(&mut self, buf: &mut String) -> Result<usize>;
}

/// Trait for writing to the host's command endpoint
#[async_trait]
pub trait AsyncWriter: Send {
    /// Write `data` and flush it before returning
    async fn write_message(&mut self, data: &[u8]) -> Result<()>;
}

/// Buffered line reader over any async byte stream
pub struct LineReadWrapper<R>(BufReader<R>);

impl<R: AsyncRead + Unpin + Send> LineReadWrapper<R> {
    pub fn new(inner: R) -> Self {
        Self(BufReader::new(inner))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> AsyncReader for LineReadWrapper<R> {
    async fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        self.0
            .read_line(buf)
            .await
            .map_err(|e| ScriptError::IpcError(format!("Pipe read failed: {}", e)))
    }
}

/// Unbuffered writer over any async byte stream
pub struct WriteWrapper<W>(pub W);

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> AsyncWriter for WriteWrapper<W> {
    async fn write_message(&mut self, data: &[u8]) -> Result<()> {
        self.0
            .write_all(data)
            .await
            .map_err(|e| ScriptError::IpcError(format!("Pipe write failed: {}", e)))?;

        // Nothing may straddle command boundaries
        self.0
            .flush()
            .await
            .map_err(|e| ScriptError::IpcError(format!("Pipe flush failed: {}", e)))?;

        Ok(())
    }
}

/// An opened pair of endpoints plus the terminator the host expects
pub struct Transport {
    pub reader: Box<dyn AsyncReader>,
    pub writer: Box<dyn AsyncWriter>,
    pub line_ending: LineEnding,
}

impl Transport {
    pub fn new(
        reader: impl AsyncReader + 'static,
        writer: impl AsyncWriter + 'static,
        line_ending: LineEnding,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            line_ending,
        }
    }

    /// Wrap raw byte streams
    pub fn from_streams<R, W>(reader: R, writer: W, line_ending: LineEnding) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::new(LineReadWrapper::new(reader), WriteWrapper(writer), line_ending)
    }
}

/// Platform strategy for locating and opening the two endpoints
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Endpoints this resolver opens
    fn endpoints(&self) -> &EndpointPair;

    /// Terminator appended to every command
    fn line_ending(&self) -> LineEnding;

    /// Check that both endpoints exist, then open them.
    ///
    /// Fails with `ToChannelNotExist`/`FromChannelNotExist` before opening
    /// anything if either endpoint is missing.
    async fn connect(&self) -> Result<Transport>;
}

/// Resolver for the platform this binary was built for.
///
/// `pipe_dir` overrides the FIFO directory on unix.
#[cfg(unix)]
pub fn platform_resolver(pipe_dir: Option<&Path>) -> Box<dyn EndpointResolver> {
    match pipe_dir {
        Some(dir) => Box::new(crate::unix::FifoResolver::in_dir(dir)),
        None => Box::new(crate::unix::FifoResolver::new()),
    }
}

/// Resolver for the platform this binary was built for.
///
/// Windows pipe names are fixed, so `pipe_dir` is ignored.
#[cfg(windows)]
pub fn platform_resolver(_pipe_dir: Option<&Path>) -> Box<dyn EndpointResolver> {
    Box::new(crate::windows::NamedPipeResolver::new())
}
