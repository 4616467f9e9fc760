//! In-memory transport for tests.
//!
//! [`FakeDevice`] hands out a connector and a clock that record every call
//! into one shared log, so tests can assert on ordering across the
//! transport, the channel and the settle delays.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::session::{Backend, SettleDelays};
use super::transport::{Channel, Clock, Connector, Credentials, Result, Transport, TransportError};

/// Bytes handed out per read, small enough to force several reads
const FAKE_READ_CHUNK: usize = 16;

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    OpenShell,
    Write(String),
    Sleep(Duration),
    Read,
    Close,
}

/// Where the fake device fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Failure {
    #[default]
    None,
    Authentication,
    Network,
    Unknown,
    Shell,
    Write,
    Read,
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    opens: usize,
    closes: usize,
    failure: Failure,
    echo: bool,
    pending: VecDeque<u8>,
}

/// Scriptable stand-in for a router or switch
#[derive(Clone, Default)]
pub struct FakeDevice {
    shared: Arc<Mutex<Shared>>,
}

impl FakeDevice {
    /// Device that echoes every write back as output
    pub fn echoing() -> Self {
        let device = Self::default();
        device.lock().echo = true;
        device
    }

    /// Device that accepts input but never produces output
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn failing(failure: Failure) -> Self {
        let device = Self::echoing();
        device.lock().failure = failure;
        device
    }

    /// Backend whose settle delays are recorded instead of slept
    pub fn backend(&self) -> Backend {
        Backend {
            connector: Arc::new(FakeConnector {
                shared: self.shared.clone(),
            }),
            clock: Arc::new(FakeClock {
                shared: self.shared.clone(),
            }),
            delays: SettleDelays::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn writes(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock(&self.shared)
    }
}

fn lock(shared: &Arc<Mutex<Shared>>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct FakeConnector {
    shared: Arc<Mutex<Shared>>,
}

impl Connector for FakeConnector {
    fn connect(
        &self,
        host: &str,
        credentials: &Credentials,
        _timeout: Duration,
    ) -> Result<Box<dyn Transport>> {
        let mut shared = lock(&self.shared);
        shared.calls.push(Call::Connect(host.to_string()));

        match shared.failure {
            Failure::Authentication => Err(TransportError::Authentication {
                user: credentials.username.clone(),
            }),
            Failure::Network => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Failure::Unknown => Err(TransportError::Other("resolver exploded".to_string())),
            _ => {
                shared.opens += 1;
                Ok(Box::new(FakeTransport {
                    shared: self.shared.clone(),
                }))
            }
        }
    }
}

struct FakeTransport {
    shared: Arc<Mutex<Shared>>,
}

impl Transport for FakeTransport {
    fn open_shell(&mut self) -> Result<Box<dyn Channel>> {
        let mut shared = lock(&self.shared);
        shared.calls.push(Call::OpenShell);

        if shared.failure == Failure::Shell {
            return Err(TransportError::Closed);
        }
        Ok(Box::new(FakeChannel {
            shared: self.shared.clone(),
        }))
    }

    fn close(&mut self) {
        let mut shared = lock(&self.shared);
        shared.calls.push(Call::Close);
        shared.closes += 1;
    }
}

struct FakeChannel {
    shared: Arc<Mutex<Shared>>,
}

impl Channel for FakeChannel {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut shared = lock(&self.shared);
        shared
            .calls
            .push(Call::Write(String::from_utf8_lossy(data).into_owned()));

        if shared.failure == Failure::Write {
            return Err(TransportError::Closed);
        }
        if shared.echo {
            shared.pending.extend(data.iter().copied());
        }
        Ok(())
    }

    fn read_available(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut shared = lock(&self.shared);
        shared.calls.push(Call::Read);

        if shared.failure == Failure::Read {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe closed",
            )));
        }

        let n = buffer.len().min(shared.pending.len()).min(FAKE_READ_CHUNK);
        for slot in buffer.iter_mut().take(n) {
            if let Some(byte) = shared.pending.pop_front() {
                *slot = byte;
            }
        }
        Ok(n)
    }
}

struct FakeClock {
    shared: Arc<Mutex<Shared>>,
}

impl Clock for FakeClock {
    fn sleep(&self, duration: Duration) {
        lock(&self.shared).calls.push(Call::Sleep(duration));
    }
}
