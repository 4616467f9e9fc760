//! Transport abstraction
//!
//! The session talks to a device through three small traits so the SSH
//! implementation can be swapped for an in-memory one in tests:
//!
//! - [`Connector`] opens an authenticated [`Transport`] to a host
//! - [`Transport`] opens the interactive [`Channel`] and tears everything down
//! - [`Channel`] is the bidirectional text stream of the remote shell
//!
//! Settle delays go through [`Clock`] for the same reason.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("authentication rejected for user {user}")]
    Authentication { user: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SSH protocol error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("channel closed by remote")]
    Closed,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Login credentials for the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opens authenticated transports.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        host: &str,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>>;
}

/// An authenticated, encrypted connection to one device.
pub trait Transport: Send {
    /// Open a persistent interactive shell channel
    fn open_shell(&mut self) -> Result<Box<dyn Channel>>;

    /// Close the connection and every channel multiplexed over it
    fn close(&mut self);
}

/// Interactive shell stream.
pub trait Channel: Send {
    /// Write all of `data` to the remote shell
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read bytes that are already available - non-blocking
    ///
    /// Returns 0 when nothing is ready or the remote side has sent EOF.
    fn read_available(&mut self, buffer: &mut [u8]) -> Result<usize>;
}

/// Source of the settle delays.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
