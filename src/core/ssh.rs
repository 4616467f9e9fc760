//! SSH transport built on libssh2
//!
//! Password authentication (with a keyboard-interactive fallback), a `vt100`
//! pseudo-terminal and an interactive shell, the same shape of session an
//! operator gets from a terminal client.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use ssh2::{ErrorCode, HashType, KeyboardInteractivePrompt, Prompt};
use tracing::{debug, warn};

use super::transport::{Channel, Connector, Credentials, Result, Transport, TransportError};

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// libssh2 status for rejected credentials
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;

/// Method name as listed by the server
const KEYBOARD_INTERACTIVE: &str = "keyboard-interactive";

/// Terminal type requested for the shell channel
const PTY_TERM: &str = "vt100";

/// Opens SSH transports with password authentication.
///
/// Host keys are accepted without verification; the fingerprint is logged.
#[derive(Debug, Clone)]
pub struct SshConnector {
    port: u16,
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

impl SshConnector {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    fn open_tcp(&self, host: &str, timeout: Duration) -> Result<TcpStream> {
        let addrs = (host, self.port).to_socket_addrs()?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(%addr, "TCP connect failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(TransportError::Io(e)),
            None => Err(TransportError::Other(format!(
                "{} did not resolve to any address",
                host
            ))),
        }
    }
}

impl Connector for SshConnector {
    fn connect(
        &self,
        host: &str,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>> {
        let tcp = self.open_tcp(host, timeout)?;

        let mut session = ssh2::Session::new()?;
        session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
        session.set_tcp_stream(tcp);
        session.handshake()?;

        if let Some(hash) = session.host_key_hash(HashType::Sha256) {
            let fingerprint: String = hash.iter().map(|b| format!("{:02x}", b)).collect();
            debug!(host, "Accepting host key SHA256:{}", fingerprint);
        }

        authenticate(&session, credentials)?;

        Ok(Box::new(SshTransport { session }))
    }
}

/// Password login, then keyboard-interactive with the same password when the
/// server rejects the first attempt and offers it.
fn authenticate(session: &ssh2::Session, credentials: &Credentials) -> Result<()> {
    let user = credentials.username.as_str();

    if let Err(e) = session.userauth_password(user, &credentials.password) {
        let err = auth_error(e, user);
        if !matches!(err, TransportError::Authentication { .. }) {
            return Err(err);
        }

        let methods = session.auth_methods(user).unwrap_or_default();
        if !offers_keyboard_interactive(methods) {
            return Err(err);
        }

        debug!(user, "Password rejected, trying {}", KEYBOARD_INTERACTIVE);
        let mut prompt = PasswordPrompt {
            password: &credentials.password,
        };
        session
            .userauth_keyboard_interactive(user, &mut prompt)
            .map_err(|e| auth_error(e, user))?;
    }

    if !session.authenticated() {
        return Err(TransportError::Authentication {
            user: user.to_string(),
        });
    }
    Ok(())
}

/// Rejected credentials are `Authentication`; anything else is a protocol error
fn auth_error(e: ssh2::Error, user: &str) -> TransportError {
    match e.code() {
        ErrorCode::Session(LIBSSH2_ERROR_AUTHENTICATION_FAILED) => TransportError::Authentication {
            user: user.to_string(),
        },
        _ => TransportError::Ssh(e),
    }
}

/// `methods` is the comma-separated list from the server
fn offers_keyboard_interactive(methods: &str) -> bool {
    methods.split(',').any(|m| m.trim() == KEYBOARD_INTERACTIVE)
}

/// Answers every challenge with the login password
struct PasswordPrompt<'a> {
    password: &'a str,
}

impl KeyboardInteractivePrompt for PasswordPrompt<'_> {
    fn prompt<'b>(&mut self, _username: &str, _instructions: &str, prompts: &[Prompt<'b>]) -> Vec<String> {
        prompts.iter().map(|_| self.password.to_string()).collect()
    }
}

/// An authenticated libssh2 session
struct SshTransport {
    session: ssh2::Session,
}

impl Transport for SshTransport {
    fn open_shell(&mut self) -> Result<Box<dyn Channel>> {
        let mut channel = self.session.channel_session()?;
        channel.request_pty(PTY_TERM, None, None)?;
        channel.shell()?;

        Ok(Box::new(SshChannel {
            session: self.session.clone(),
            channel,
        }))
    }

    fn close(&mut self) {
        if let Err(e) = self
            .session
            .disconnect(None, "closing configuration session", None)
        {
            warn!("SSH disconnect failed: {}", e);
        }
    }
}

/// Shell channel; keeps a session handle to toggle blocking mode
struct SshChannel {
    session: ssh2::Session,
    channel: ssh2::Channel,
}

impl Channel for SshChannel {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.channel.eof() {
            return Err(TransportError::Closed);
        }
        self.channel.write_all(data)?;
        self.channel.flush()?;
        Ok(())
    }

    fn read_available(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if self.channel.eof() {
            return Ok(0);
        }

        self.session.set_blocking(false);
        let result = self.channel.read(buffer);
        self.session.set_blocking(true);

        match result {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}
