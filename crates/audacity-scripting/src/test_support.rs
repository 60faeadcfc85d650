//! Shared setup for tests that talk to the mock

use crate::scripting::AudacityScripting;
use audacity_bridge::{FifoResolver, Session, SessionConfig};
use audacity_mock::MockServer;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) async fn connect() -> (TempDir, MockServer, AudacityScripting) {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start_in(dir.path()).await.unwrap();
    let config = SessionConfig {
        pipe_dir: Some(dir.path().to_path_buf()),
        response_timeout: Some(Duration::from_secs(10)),
    };
    let session = Session::open_with(&FifoResolver::in_dir(dir.path()), config)
        .await
        .unwrap();
    (dir, server, AudacityScripting::new(session))
}
