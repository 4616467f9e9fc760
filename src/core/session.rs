//! Session management
//!
//! One authenticated, privilege-elevated shell on one device.
//!
//! Synchronisation with the remote CLI is done with fixed settle delays, not
//! prompt detection: after a write the session sleeps, then drains whatever
//! output is already buffered. A slow device can therefore yield truncated or
//! empty output. Command output is returned as-is and never inspected for
//! device-side errors such as `% Invalid input`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use super::ssh::SshConnector;
use super::transport::{Channel, Clock, Connector, Credentials, SystemClock, Transport, TransportError};

/// Default timeout for establishing the transport
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Command that enters privileged EXEC mode
pub const ENABLE_COMMAND: &str = "enable";

/// Command that enters global configuration mode
pub const CONFIGURE_COMMAND: &str = "configure terminal";

/// Read buffer size for draining channel output
const READ_CHUNK: usize = 65535;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("authentication failed for {host}")]
    Authentication {
        host: String,
        #[source]
        source: TransportError,
    },

    #[error("transport error while connecting to {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: TransportError,
    },

    #[error("unexpected error while connecting to {host}: {message}")]
    Unknown { host: String, message: String },
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("no active session to {host}, connect first")]
    NotConnected { host: String },

    #[error("transport error while talking to {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: TransportError,
    },
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// Fixed waits that give the remote CLI time to process input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    /// After the shell channel is opened
    pub shell: Duration,
    /// After the privilege escalation sequence
    pub escalate: Duration,
    /// After each command block
    pub command: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            shell: Duration::from_secs(1),
            escalate: Duration::from_secs(2),
            command: Duration::from_secs(2),
        }
    }
}

/// Everything a session needs besides its target
#[derive(Clone)]
pub struct Backend {
    pub connector: Arc<dyn Connector>,
    pub clock: Arc<dyn Clock>,
    pub delays: SettleDelays,
}

impl Default for Backend {
    fn default() -> Self {
        Self::ssh(super::ssh::DEFAULT_PORT, SettleDelays::default())
    }
}

impl Backend {
    /// SSH on `port` with the wall clock
    pub fn ssh(port: u16, delays: SettleDelays) -> Self {
        Self {
            connector: Arc::new(SshConnector::new(port)),
            clock: Arc::new(SystemClock),
            delays,
        }
    }
}

/// Transport and shell channel, always held together
struct Link {
    transport: Box<dyn Transport>,
    channel: Box<dyn Channel>,
}

/// A configuration session to one device
pub struct Session {
    host: String,
    credentials: Credentials,
    backend: Backend,
    /// Present only while connected
    link: Option<Link>,
}

impl Session {
    /// Create a disconnected SSH session. No I/O happens here.
    #[allow(dead_code)]
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self::with_backend(host, credentials, Backend::default())
    }

    pub fn with_backend(host: impl Into<String>, credentials: Credentials, backend: Backend) -> Self {
        Self {
            host: host.into(),
            credentials,
            backend,
            link: None,
        }
    }

    #[allow(dead_code)]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[allow(dead_code)]
    pub fn state(&self) -> SessionState {
        if self.link.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    #[allow(dead_code)]
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Connect, open the shell and enter configuration mode.
    ///
    /// On any failure the transport is closed before the error is returned,
    /// so the session is always left `Disconnected`.
    pub fn connect(&mut self, privileged_password: &str, timeout: Duration) -> Result<(), ConnectError> {
        if self.link.is_some() {
            warn!(host = %self.host, "Already connected, reconnecting");
            self.close();
        }

        info!(host = %self.host, "Attempting to connect...");

        let mut transport = self
            .backend
            .connector
            .connect(&self.host, &self.credentials, timeout)
            .map_err(|e| self.connect_error(e))?;
        info!(host = %self.host, "SSH connection established");

        match self.elevate(transport.as_mut(), privileged_password) {
            Ok(channel) => {
                self.link = Some(Link { transport, channel });
                info!(host = %self.host, "Entered configuration mode");
                Ok(())
            }
            Err(e) => {
                transport.close();
                Err(self.connect_error(e))
            }
        }
    }

    /// Open the shell and send the escalation sequence
    fn elevate(
        &self,
        transport: &mut dyn Transport,
        privileged_password: &str,
    ) -> Result<Box<dyn Channel>, TransportError> {
        let mut channel = transport.open_shell()?;
        self.backend.clock.sleep(self.backend.delays.shell);

        let sequence = format!(
            "{}\n{}\n{}\n",
            ENABLE_COMMAND, privileged_password, CONFIGURE_COMMAND
        );
        channel.write(sequence.as_bytes())?;
        self.backend.clock.sleep(self.backend.delays.escalate);

        Ok(channel)
    }

    /// Map and log a transport failure during connect
    fn connect_error(&self, err: TransportError) -> ConnectError {
        let host = self.host.clone();
        match err {
            TransportError::Authentication { .. } => {
                error!(host = %host, "Authentication failed");
                ConnectError::Authentication { host, source: err }
            }
            TransportError::Io(_) | TransportError::Ssh(_) | TransportError::Closed => {
                error!(host = %host, "SSH error while connecting: {}", err);
                ConnectError::Transport { host, source: err }
            }
            TransportError::Other(message) => {
                error!(host = %host, "Unexpected error while connecting: {}", message);
                ConnectError::Unknown { host, message }
            }
        }
    }

    /// Send a command block and return whatever output arrived.
    ///
    /// Performs one write, waits the command settle delay, then drains the
    /// channel without blocking. Output may be incomplete.
    pub fn send(&mut self, command: &str) -> Result<String, SendError> {
        let Some(link) = self.link.as_mut() else {
            error!(host = %self.host, "No active SSH session, connect first");
            return Err(SendError::NotConnected {
                host: self.host.clone(),
            });
        };

        info!(host = %self.host, "Sending command: {}", command);

        let mut payload = String::with_capacity(command.len() + 1);
        payload.push_str(command);
        payload.push('\n');

        let host = &self.host;
        let transport_error = |source: TransportError| {
            error!(host = %host, "Failed to send command: {}", source);
            SendError::Transport {
                host: host.clone(),
                source,
            }
        };

        link.channel
            .write(payload.as_bytes())
            .map_err(transport_error)?;

        self.backend.clock.sleep(self.backend.delays.command);

        let output = drain(link.channel.as_mut()).map_err(transport_error)?;
        info!(host = %self.host, bytes = output.len(), "Command executed");
        Ok(output)
    }

    /// Close the transport. No-op when already disconnected.
    pub fn close(&mut self) {
        match self.link.take() {
            Some(Link {
                mut transport,
                channel,
            }) => {
                info!(host = %self.host, "Closing SSH connection");
                drop(channel);
                transport.close();
                info!(host = %self.host, "SSH connection closed");
            }
            None => {
                info!(host = %self.host, "No active connection to close");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.link.is_some() {
            self.close();
        }
    }
}

/// Read everything immediately available and decode it
fn drain(channel: &mut dyn Channel) -> Result<String, TransportError> {
    let mut buffer = vec![0u8; READ_CHUNK];
    let mut collected = Vec::new();

    loop {
        let n = channel.read_available(&mut buffer)?;
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&buffer[..n]);
    }

    // Decode once so multi-byte sequences split across reads survive
    Ok(String::from_utf8_lossy(&collected).into_owned())
}
