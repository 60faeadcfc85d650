//! Named-pipe transport and command channel for Audacity mod-script-pipe
//!
//! This crate provides:
//! - Transport abstractions (AsyncReader/AsyncWriter, EndpointResolver)
//! - FIFO (unix) and named pipe (Windows) endpoint resolvers
//! - Wire framing for commands and blank-line terminated replies
//! - `Session`, the half-duplex request/response channel

pub mod protocol;
pub mod session;
pub mod transport;
#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;


pub use protocol::{encode_command, read_response};
pub use session::{Session, SessionConfig};
pub use transport::{AsyncReader, AsyncWriter, EndpointResolver, Transport, platform_resolver};
#[cfg(unix)]
pub use unix::FifoResolver;
#[cfg(windows)]
pub use windows::NamedPipeResolver;
