//! Request/response session over the scripting pipes
//!
//! A session is half-duplex: one command is sent, then its reply is read in
//! full before the next command. Methods take `&mut self`, so a session
//! cannot have two commands in flight; share it across tasks behind a mutex.

use crate::protocol::{encode_command, read_response};
use crate::transport::{EndpointResolver, Transport, platform_resolver};
use audacity_core::{LineEnding, RawResponse, Result, ScriptError};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Instrument, Span, debug, info, info_span, warn};

/// Configuration for opening a session
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Directory holding the FIFOs (unix only, default `/tmp`)
    pub pipe_dir: Option<PathBuf>,
    /// Deadline for each `run`; `None` waits forever
    pub response_timeout: Option<Duration>,
}

/// An open conversation with Audacity
pub struct Session {
    transport: Transport,
    config: SessionConfig,
    /// Set while a send or receive is in progress; stays set if one is abandoned
    busy: bool,
    span: Span,
}

impl Session {
    /// Open the platform's default endpoints
    pub async fn open(config: SessionConfig) -> Result<Self> {
        let resolver = platform_resolver(config.pipe_dir.as_deref());
        Self::open_with(resolver.as_ref(), config).await
    }

    /// Open the endpoints named by `resolver`
    pub async fn open_with(resolver: &dyn EndpointResolver, config: SessionConfig) -> Result<Self> {
        let span = info_span!("session", endpoints = %resolver.endpoints());
        let transport = resolver.connect().instrument(span.clone()).await?;
        span.in_scope(|| info!("Session open"));

        Ok(Self {
            transport,
            config,
            busy: false,
            span,
        })
    }

    /// Session over an already opened transport
    pub fn from_transport(transport: Transport, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            busy: false,
            span: info_span!("session"),
        }
    }

    pub fn line_ending(&self) -> LineEnding {
        self.transport.line_ending
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Write `command` plus the terminator and flush
    pub async fn send(&mut self, command: &str) -> Result<()> {
        self.begin()?;
        let data = encode_command(command, self.transport.line_ending);
        debug!(parent: &self.span, "[Rust→Audacity] {}", command);
        self.transport.writer.write_message(&data).await?;
        self.busy = false;
        Ok(())
    }

    /// Read one reply up to its terminating blank line, without validating it
    pub async fn receive(&mut self) -> Result<RawResponse> {
        self.begin()?;
        let response = read_response(self.transport.reader.as_mut())
            .instrument(self.span.clone())
            .await?;
        self.busy = false;

        let preview: String = response.as_str().chars().take(200).collect();
        debug!(parent: &self.span, "[Audacity→Rust] len={} {}", response.as_str().len(), preview);
        Ok(response)
    }

    /// Send a command, read its reply and check the status line.
    ///
    /// Uses the configured response timeout, if any.
    pub async fn run(&mut self, command: &str) -> Result<RawResponse> {
        match self.config.response_timeout {
            Some(timeout) => self.run_with_timeout(command, timeout).await,
            None => self.run_inner(command).await,
        }
    }

    /// Like [`Session::run`] with an explicit deadline.
    ///
    /// A timed-out reply may still arrive later, so the session refuses
    /// further commands with [`ScriptError::Desynchronized`].
    pub async fn run_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<RawResponse> {
        match tokio::time::timeout(timeout, self.run_inner(command)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(parent: &self.span, "No response to {:?} within {:?}", command, timeout);
                Err(ScriptError::Timeout(timeout))
            }
        }
    }

    /// Run a query command and decode its JSON payload
    pub async fn get_json(&mut self, command: &str) -> Result<serde_json::Value> {
        self.run(command).await?.json()
    }

    /// Run a query command and decode its payload into `T`
    pub async fn get_json_as<T: DeserializeOwned>(&mut self, command: &str) -> Result<T> {
        self.run(command).await?.json_as()
    }

    /// Close both endpoints. Dropping the session does the same.
    pub fn close(self) {
        self.span.in_scope(|| info!("Handles closed"));
    }

    async fn run_inner(&mut self, command: &str) -> Result<RawResponse> {
        info!(parent: &self.span, "Command: {}", command);
        self.send(command).await?;
        let response = self.receive().await?;
        response.validate()?;
        Ok(response)
    }

    fn begin(&mut self) -> Result<()> {
        if self.busy {
            return Err(ScriptError::Desynchronized);
        }
        self.busy = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn scripted(mock: tokio_test::io::Mock, line_ending: LineEnding) -> Session {
        let (reader, writer) = tokio::io::split(mock);
        Session::from_transport(
            Transport::from_streams(reader, writer, line_ending),
            SessionConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_run_success() {
        let mock = Builder::new()
            .write(b"SelectAll:\n")
            .read(b"BatchCommand finished: OK\n\n")
            .build();
        let mut session = scripted(mock, LineEnding::Lf);

        let response = session.run("SelectAll:").await.unwrap();
        assert_eq!(response, "BatchCommand finished: OK\n");
    }

    #[tokio::test]
    async fn test_run_windows_terminator() {
        let mock = Builder::new()
            .write(b"SelectAll:\r\n\0")
            .read(b"\r\nBatchCommand finished: OK\r\n\r\n")
            .build();
        let mut session = scripted(mock, LineEnding::CrLfNul);

        let response = session.run("SelectAll:").await.unwrap();
        assert_eq!(response, "BatchCommand finished: OK\n");
    }

    #[tokio::test]
    async fn test_run_failure_carries_status() {
        let mock = Builder::new()
            .write(b"Bogus:\n")
            .read(b"Your batch command of bogus was not recognized.\nBatchCommand finished: Failed!\n\n")
            .build();
        let mut session = scripted(mock, LineEnding::Lf);

        let err = session.run("Bogus:").await.unwrap_err();
        assert!(err.is_command_failure());
        assert!(err.to_string().contains("Failed!"));
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_session() {
        let mock = Builder::new()
            .write(b"Bogus:\n")
            .read(b"BatchCommand finished: Failed!\n\n")
            .write(b"SelectNone:\n")
            .read(b"BatchCommand finished: OK\n\n")
            .build();
        let mut session = scripted(mock, LineEnding::Lf);

        assert!(session.run("Bogus:").await.is_err());
        assert!(session.run("SelectNone:").await.is_ok());
    }

    #[tokio::test]
    async fn test_send_then_receive() {
        let mock = Builder::new()
            .write(b"GetInfo: Type=Tracks\n")
            .read(b"[ \n  { \"name\":\"L - AT2050\", \"kind\":\"wave\" } ]\nBatchCommand finished: OK\n\n")
            .build();
        let mut session = scripted(mock, LineEnding::Lf);

        session.send("GetInfo: Type=Tracks").await.unwrap();
        let response = session.receive().await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.json().unwrap()[0]["name"], "L - AT2050");
    }

    #[tokio::test]
    async fn test_get_json() {
        let mock = Builder::new()
            .write(b"GetInfo: Type=Clips\n")
            .read(b"[ \n  { \"track\":0, \"start\":0, \"end\":8328.9, \"color\":0 } ]\nBatchCommand finished: OK\n\n")
            .build();
        let mut session = scripted(mock, LineEnding::Lf);

        let clips: Vec<audacity_core::ClipInfo> =
            session.get_json_as("GetInfo: Type=Clips").await.unwrap();
        assert_eq!(clips[0].end, 8328.9);
    }

    #[tokio::test]
    async fn test_peer_closed() {
        let mock = Builder::new().write(b"SelectAll:\n").build();
        let mut session = scripted(mock, LineEnding::Lf);

        let err = session.run("SelectAll:").await.unwrap_err();
        assert!(matches!(err, ScriptError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_timeout_desynchronizes() {
        // Peer stays open but never answers
        let (client, _host) = tokio::io::duplex(1024);
        let (reader, writer) = tokio::io::split(client);
        let mut session = Session::from_transport(
            Transport::from_streams(reader, writer, LineEnding::Lf),
            SessionConfig {
                response_timeout: Some(Duration::from_millis(50)),
                ..Default::default()
            },
        );

        let err = session.run("SelectAll:").await.unwrap_err();
        assert!(matches!(err, ScriptError::Timeout(_)));

        let err = session.run("SelectAll:").await.unwrap_err();
        assert!(matches!(err, ScriptError::Desynchronized));
    }
}
