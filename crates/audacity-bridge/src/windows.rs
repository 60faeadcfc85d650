//! Named pipe transport for Windows

use crate::transport::{EndpointResolver, Transport};
use async_trait::async_trait;
use audacity_core::{EndpointPair, LineEnding, Result, ScriptError};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};
use tracing::{debug, info, warn};

const PIPE_NAMESPACE: &str = r"\\.\pipe\";

/// `ERROR_PIPE_BUSY`: all instances of the pipe are connected
const ERROR_PIPE_BUSY: i32 = 231;

const BUSY_RETRIES: usize = 5;
const BUSY_INTERVAL: Duration = Duration::from_millis(50);

/// Resolves the fixed `ToSrvPipe`/`FromSrvPipe` pair
#[derive(Debug, Clone)]
pub struct NamedPipeResolver {
    endpoints: EndpointPair,
}

impl NamedPipeResolver {
    pub fn new() -> Self {
        Self::with_endpoints(EndpointPair::named_pipes())
    }

    pub fn with_endpoints(endpoints: EndpointPair) -> Self {
        Self { endpoints }
    }
}

impl Default for NamedPipeResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointResolver for NamedPipeResolver {
    fn endpoints(&self) -> &EndpointPair {
        &self.endpoints
    }

    fn line_ending(&self) -> LineEnding {
        LineEnding::CrLfNul
    }

    async fn connect(&self) -> Result<Transport> {
        let to_name = &self.endpoints.to_host;
        let from_name = &self.endpoints.from_host;

        // Listing the namespace does not take a pipe instance, opening does
        match listening_pipes() {
            Some(listed) => check_listening(&self.endpoints, &listed)?,
            None => debug!("Pipe namespace not listable, relying on open"),
        }

        info!("Write to {:?}", to_name);
        let to_pipe = open_pipe(to_name, ScriptError::ToChannelNotExist).await?;

        info!("Read from {:?}", from_name);
        let from_pipe = open_pipe(from_name, ScriptError::FromChannelNotExist).await?;

        info!("Both pipes opened");

        Ok(Transport::from_streams(
            from_pipe,
            to_pipe,
            LineEnding::CrLfNul,
        ))
    }
}

/// Lowercased names of the pipes currently listening, if the namespace can be read
fn listening_pipes() -> Option<HashSet<String>> {
    let entries = std::fs::read_dir(PIPE_NAMESPACE).ok()?;
    Some(
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_lowercase())
            .collect(),
    )
}

/// Name of `path` inside the pipe namespace; pipe names are case-insensitive
fn pipe_name(path: &Path) -> String {
    let full = path.to_string_lossy();
    let name = match full.get(..PIPE_NAMESPACE.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(PIPE_NAMESPACE) => &full[PIPE_NAMESPACE.len()..],
        _ => &full[..],
    };
    name.to_lowercase()
}

/// Both endpoints must be listening before either is opened
fn check_listening(endpoints: &EndpointPair, listed: &HashSet<String>) -> Result<()> {
    if !listed.contains(&pipe_name(&endpoints.to_host)) {
        return Err(ScriptError::ToChannelNotExist(
            endpoints.to_host.display().to_string(),
        ));
    }
    if !listed.contains(&pipe_name(&endpoints.from_host)) {
        return Err(ScriptError::FromChannelNotExist(
            endpoints.from_host.display().to_string(),
        ));
    }
    Ok(())
}

async fn open_pipe(
    name: &Path,
    missing: fn(String) -> ScriptError,
) -> Result<NamedPipeClient> {
    let mut attempt = 0;
    loop {
        match ClientOptions::new().open(name) {
            Ok(client) => return Ok(client),
            Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                attempt += 1;
                if attempt > BUSY_RETRIES {
                    warn!("{:?} stayed busy", name);
                    return Err(ScriptError::PipeBusy(name.display().to_string()));
                }
                debug!("{:?} busy, attempt {}", name, attempt);
                tokio::time::sleep(BUSY_INTERVAL).await;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(missing(name.display().to_string()));
            }
            Err(e) => {
                return Err(ScriptError::IpcError(format!(
                    "Failed to open {:?}: {}",
                    name, e
                )));
            }
        }
    }
}
