//! The mock's pipe server
//!
//! Lifecycle: the endpoints are created by [`MockServer::start`], a background
//! task waits for one client, answers its commands until the client closes
//! the command pipe, then removes what it created and stops.
//!
//! [`MockServer::shutdown`] or dropping the handle stops the mock at any
//! point, including while it still waits for a client to open the pipes.

use crate::responder::Responder;
use audacity_core::{EndpointPair, Result, ScriptError};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span};

/// Observable position of the server loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockState {
    /// Endpoints exist, between commands or before a client connects
    Idle,
    /// Waiting for the next command line
    Listening,
    /// Writing a reply
    Serving,
    /// Client gone or mock shut down, endpoints removed
    Stopped,
}

/// Handle to a running mock.
///
/// Dropping the handle stops the mock and removes its endpoints.
pub struct MockServer {
    endpoints: EndpointPair,
    state: Arc<watch::Sender<MockState>>,
    gate: Arc<platform::OpenGate>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl MockServer {
    /// Create the endpoints and start serving in the background.
    ///
    /// The endpoints exist when this returns, so a client may connect
    /// straight away.
    pub async fn start(endpoints: EndpointPair) -> Result<Self> {
        let (state_tx, _) = watch::channel(MockState::Idle);
        let state = Arc::new(state_tx);
        let gate = Arc::new(platform::OpenGate::default());

        let span = info_span!("mock", endpoints = %endpoints);
        let handle = span.in_scope(|| {
            platform::spawn(endpoints.clone(), state.clone(), gate.clone())
        })?;

        Ok(Self {
            endpoints,
            state,
            gate,
            handle: Some(handle),
        })
    }

    /// FIFOs for the current user in `dir`
    #[cfg(unix)]
    pub async fn start_in(dir: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::start(EndpointPair::fifo_for_current_user(dir)).await
    }

    pub fn endpoints(&self) -> &EndpointPair {
        &self.endpoints
    }

    pub fn state(&self) -> MockState {
        *self.state.borrow()
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<MockState> {
        self.state.subscribe()
    }

    /// Wait for the client to disconnect and the server to clean up
    pub async fn join(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| ScriptError::IpcError(format!("Mock task failed: {}", e)))?,
            None => Ok(()),
        }
    }

    /// Stop serving now, whether or not a client is connected.
    ///
    /// A connected client sees its pipes close. Returns the serve loop's
    /// error if it had already failed.
    pub async fn shutdown(mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.stop(&handle);

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(ScriptError::IpcError(format!("Mock task failed: {}", e))),
        }
    }

    fn stop(&self, handle: &JoinHandle<Result<()>>) {
        if handle.is_finished() {
            return;
        }
        info!("Shutting down mock on {}", self.endpoints);

        // Release a pending open before the endpoints disappear
        self.gate.release(&self.endpoints);
        handle.abort();
        platform::remove_endpoints(&self.endpoints);
        self.state.send_replace(MockState::Stopped);
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop(&handle);
        }
    }
}

/// Answer commands until the client closes its end.
///
/// Blank lines get no reply. A broken pipe on write counts as a normal
/// shutdown.
pub(crate) async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    state: &watch::Sender<MockState>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut responder = Responder::new();

    loop {
        state.send_replace(MockState::Listening);

        let mut command = String::new();
        let bytes_read = reader
            .read_line(&mut command)
            .await
            .map_err(|e| ScriptError::IpcError(format!("Command read failed: {}", e)))?;
        if bytes_read == 0 {
            info!("Client closed the command pipe");
            return Ok(());
        }

        let trimmed = command.trim_matches(|c| matches!(c, '\r' | '\n' | '\0'));
        if trimmed.is_empty() {
            continue;
        }

        state.send_replace(MockState::Serving);
        info!("command: {}", trimmed);
        let response = responder.respond(trimmed);
        debug!("reply: {:?}", response);

        let written = async {
            writer.write_all(response.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        match written {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                info!("Client closed the response pipe");
                return Ok(());
            }
            Err(e) => {
                return Err(ScriptError::IpcError(format!("Reply write failed: {}", e)));
            }
        }

        state.send_replace(MockState::Idle);
    }
}

#[cfg(unix)]
mod platform {
    use super::{MockState, serve};
    use audacity_core::{EndpointPair, Result, ScriptError};
    use nix::fcntl::OFlag;
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;
    use std::fs::{File, OpenOptions};
    use std::io::ErrorKind;
    use std::os::unix::fs::OpenOptionsExt;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::io::BufReader;
    use tokio::net::unix::pipe;
    use tokio::sync::watch;
    use tokio::task::JoinHandle;
    use tracing::{Instrument, Span, info, warn};

    const RELEASE_ATTEMPTS: usize = 100;
    const RELEASE_INTERVAL: Duration = Duration::from_millis(10);

    /// Coordinates the blocking FIFO opens with shutdown.
    ///
    /// The opening thread raises `opening` before it checks `stopping`, and
    /// shutdown raises `stopping` before it checks `opening`, so either the
    /// thread never opens or shutdown sees it inside an open.
    #[derive(Debug, Default)]
    pub(super) struct OpenGate {
        stopping: AtomicBool,
        opening: AtomicBool,
    }

    impl OpenGate {
        fn enter(&self) -> bool {
            self.opening.store(true, Ordering::SeqCst);
            if self.is_stopping() {
                self.opening.store(false, Ordering::SeqCst);
                return false;
            }
            true
        }

        fn leave(&self) {
            self.opening.store(false, Ordering::SeqCst);
        }

        fn is_stopping(&self) -> bool {
            self.stopping.load(Ordering::SeqCst)
        }

        /// Stop new opens and wake a pending one by briefly opening the
        /// peer ends without blocking
        pub(super) fn release(&self, endpoints: &EndpointPair) {
            self.stopping.store(true, Ordering::SeqCst);

            for _ in 0..RELEASE_ATTEMPTS {
                if !self.opening.load(Ordering::SeqCst) {
                    return;
                }
                open_peer_ends(endpoints);
                std::thread::sleep(RELEASE_INTERVAL);
            }
            warn!("A pending FIFO open did not return");
        }
    }

    fn open_peer_ends(endpoints: &EndpointPair) {
        let nonblocking = OFlag::O_NONBLOCK.bits();

        // ENXIO here only means nobody is waiting on the command pipe yet
        let _ = OpenOptions::new()
            .write(true)
            .custom_flags(nonblocking)
            .open(&endpoints.to_host);
        let _ = OpenOptions::new()
            .read(true)
            .custom_flags(nonblocking)
            .open(&endpoints.from_host);
    }

    pub(super) fn spawn(
        endpoints: EndpointPair,
        state: Arc<watch::Sender<MockState>>,
        gate: Arc<OpenGate>,
    ) -> Result<JoinHandle<Result<()>>> {
        create_fifo(&endpoints.to_host)?;
        if let Err(e) = create_fifo(&endpoints.from_host) {
            remove_fifo(&endpoints.to_host);
            return Err(e);
        }
        info!("FIFOs created");

        Ok(tokio::spawn(
            async move {
                let result = run(&endpoints, &state, gate).await;
                remove_endpoints(&endpoints);
                state.send_replace(MockState::Stopped);
                info!("Mock stopped");
                result
            }
            .instrument(Span::current()),
        ))
    }

    pub(super) fn remove_endpoints(endpoints: &EndpointPair) {
        remove_fifo(&endpoints.to_host);
        remove_fifo(&endpoints.from_host);
    }

    async fn run(
        endpoints: &EndpointPair,
        state: &watch::Sender<MockState>,
        gate: Arc<OpenGate>,
    ) -> Result<()> {
        let to_path = endpoints.to_host.clone();
        let from_path = endpoints.from_host.clone();

        let opened = tokio::task::spawn_blocking(move || {
            if !gate.enter() {
                return Ok(None);
            }
            let result = open_pair(&to_path, &from_path, &gate);
            gate.leave();
            result
        })
        .await
        .map_err(|e| ScriptError::IpcError(format!("Pipe open task failed: {}", e)))??;

        let Some((to_file, from_file)) = opened else {
            info!("Shut down before a client connected");
            return Ok(());
        };
        info!("Client connected");

        let receiver = pipe::Receiver::from_file(to_file)
            .map_err(|e| ScriptError::IpcError(format!("Command pipe is not a FIFO: {}", e)))?;
        let sender = pipe::Sender::from_file(from_file)
            .map_err(|e| ScriptError::IpcError(format!("Response pipe is not a FIFO: {}", e)))?;

        serve(BufReader::new(receiver), sender, state).await
    }

    /// Mirror the client's order: it opens the command pipe first
    fn open_pair(
        to_path: &Path,
        from_path: &Path,
        gate: &OpenGate,
    ) -> Result<Option<(File, File)>> {
        let to_file = File::open(to_path)
            .map_err(|e| ScriptError::IpcError(format!("Failed to open {:?}: {}", to_path, e)))?;
        if gate.is_stopping() {
            return Ok(None);
        }

        let from_file = OpenOptions::new()
            .write(true)
            .open(from_path)
            .map_err(|e| {
                ScriptError::IpcError(format!("Failed to open {:?}: {}", from_path, e))
            })?;
        if gate.is_stopping() {
            return Ok(None);
        }

        Ok(Some((to_file, from_file)))
    }

    fn create_fifo(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => info!("Removed stale {:?}", path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ScriptError::IpcError(format!(
                    "Failed to remove {:?}: {}",
                    path, e
                )));
            }
        }

        mkfifo(path, Mode::S_IRWXU)
            .map_err(|e| ScriptError::IpcError(format!("mkfifo {:?} failed: {}", path, e)))
    }

    fn remove_fifo(path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {:?}: {}", path, e),
        }
    }
}

#[cfg(windows)]
mod platform {
    use super::{MockState, serve};
    use audacity_core::{EndpointPair, Result, ScriptError};
    use std::sync::Arc;
    use tokio::io::BufReader;
    use tokio::net::windows::named_pipe::ServerOptions;
    use tokio::sync::watch;
    use tokio::task::JoinHandle;
    use tracing::{Instrument, Span, info};

    /// Waiting for a client is an async `connect`, so aborting the task is
    /// enough to stop it
    #[derive(Debug, Default)]
    pub(super) struct OpenGate;

    impl OpenGate {
        pub(super) fn release(&self, _endpoints: &EndpointPair) {}
    }

    /// Named pipes vanish with their last server handle
    pub(super) fn remove_endpoints(_endpoints: &EndpointPair) {}

    pub(super) fn spawn(
        endpoints: EndpointPair,
        state: Arc<watch::Sender<MockState>>,
        _gate: Arc<OpenGate>,
    ) -> Result<JoinHandle<Result<()>>> {
        let to_server = ServerOptions::new()
            .first_pipe_instance(true)
            .create(&endpoints.to_host)
            .map_err(|e| {
                ScriptError::IpcError(format!("Failed to create {:?}: {}", endpoints.to_host, e))
            })?;
        let from_server = ServerOptions::new()
            .first_pipe_instance(true)
            .create(&endpoints.from_host)
            .map_err(|e| {
                ScriptError::IpcError(format!(
                    "Failed to create {:?}: {}",
                    endpoints.from_host, e
                ))
            })?;
        info!("Named pipes created");

        Ok(tokio::spawn(
            async move {
                let result = async {
                    to_server.connect().await.map_err(|e| {
                        ScriptError::IpcError(format!("Command pipe connect failed: {}", e))
                    })?;
                    from_server.connect().await.map_err(|e| {
                        ScriptError::IpcError(format!("Response pipe connect failed: {}", e))
                    })?;
                    info!("Client connected");
                    serve(BufReader::new(to_server), from_server, &state).await
                }
                .await;

                state.send_replace(MockState::Stopped);
                info!("Mock stopped");
                result
            }
            .instrument(Span::current()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let (client, host) = tokio::io::duplex(64 * 1024);
        let (host_read, host_write) = tokio::io::split(host);
        let (state_tx, state_rx) = watch::channel(MockState::Idle);

        let server = tokio::spawn(async move {
            serve(tokio::io::BufReader::new(host_read), host_write, &state_tx).await
        });

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"SelectAll:\nBogus:\r\n\0")
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();

        let mut replies = String::new();
        client_read.read_to_string(&mut replies).await.unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(
            replies,
            "BatchCommand finished: OK\n\n\
             Your batch command of bogus was not recognized.\nBatchCommand finished: Failed!\n\n"
        );
        assert_eq!(*state_rx.borrow(), MockState::Listening);
    }

    #[tokio::test]
    async fn test_serve_skips_blank_lines() {
        let (client, host) = tokio::io::duplex(1024);
        let (host_read, host_write) = tokio::io::split(host);
        let (state_tx, _state_rx) = watch::channel(MockState::Idle);

        let server = tokio::spawn(async move {
            serve(tokio::io::BufReader::new(host_read), host_write, &state_tx).await
        });

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(b"\n\0\nJoin:\n").await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut replies = String::new();
        client_read.read_to_string(&mut replies).await.unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(replies, "BatchCommand finished: OK\n\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_creates_fifos() {
        use std::os::unix::fs::FileTypeExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("audacity_script_pipe.to.7"), b"stale").unwrap();

        let server = MockServer::start(EndpointPair::fifo(dir.path(), 7))
            .await
            .unwrap();

        for path in [&server.endpoints().to_host, &server.endpoints().from_host] {
            let file_type = std::fs::metadata(path).unwrap().file_type();
            assert!(file_type.is_fifo(), "{:?} is not a FIFO", path);
        }
        assert_eq!(server.state(), MockState::Idle);

        // Connect and hang up so the server can finish
        let pair = server.endpoints().clone();
        tokio::task::spawn_blocking(move || {
            let to = std::fs::OpenOptions::new().write(true).open(&pair.to_host).unwrap();
            let from = std::fs::File::open(&pair.from_host).unwrap();
            drop((to, from));
        })
        .await
        .unwrap();

        let pair = server.endpoints().clone();
        server.join().await.unwrap();
        assert!(!pair.to_host.exists());
        assert!(!pair.from_host.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drop_without_client() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start(EndpointPair::fifo(dir.path(), 8))
            .await
            .unwrap();
        let pair = server.endpoints().clone();
        let mut state = server.subscribe();

        drop(server);

        assert!(!pair.to_host.exists());
        assert!(!pair.from_host.exists());
        assert_eq!(*state.borrow_and_update(), MockState::Stopped);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drop_while_open_is_pending() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start(EndpointPair::fifo(dir.path(), 9))
            .await
            .unwrap();
        let pair = server.endpoints().clone();

        // Let the server block in its open of the command pipe
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        drop(server);

        assert!(!pair.to_host.exists());
        assert!(!pair.from_host.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_without_client() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start(EndpointPair::fifo(dir.path(), 10))
            .await
            .unwrap();
        let pair = server.endpoints().clone();
        let state = server.subscribe();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        server.shutdown().await.unwrap();

        assert_eq!(*state.borrow(), MockState::Stopped);
        assert!(!pair.to_host.exists());
        assert!(!pair.from_host.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_with_connected_client() {
        use std::io::Read;

        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start(EndpointPair::fifo(dir.path(), 11))
            .await
            .unwrap();
        let pair = server.endpoints().clone();

        let client = tokio::task::spawn_blocking(move || {
            let to = std::fs::OpenOptions::new().write(true).open(&pair.to_host).unwrap();
            let mut from = std::fs::File::open(&pair.from_host).unwrap();
            let mut rest = Vec::new();
            from.read_to_end(&mut rest).unwrap();
            drop(to);
            rest
        });

        let mut state = server.subscribe();
        state
            .wait_for(|s| *s == MockState::Listening)
            .await
            .unwrap();
        server.shutdown().await.unwrap();

        // The response pipe reaches end of file once the server lets go
        assert!(client.await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_removes_first_fifo_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pair = EndpointPair {
            to_host: dir.path().join("to"),
            from_host: dir.path().join("missing").join("from"),
        };

        assert!(MockServer::start(pair.clone()).await.is_err());
        assert!(!pair.to_host.exists());
    }
}
