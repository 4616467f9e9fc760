//! A device from the inventory paired with its configuration session.

use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use crate::core::session::{Backend, ConnectError, SendError, Session};
use crate::core::transport::Credentials;
use crate::inventory::DeviceRecord;

/// Failure of one configuration job
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Send(#[from] SendError),
}

pub struct Device {
    record: DeviceRecord,
    session: Session,
}

impl Device {
    pub fn new(record: DeviceRecord, backend: Backend) -> Self {
        let credentials = Credentials::new(record.username.clone(), record.password.clone());
        let session = Session::with_backend(record.ip.clone(), credentials, backend);
        Self { record, session }
    }

    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn ip(&self) -> &str {
        &self.record.ip
    }

    #[allow(dead_code)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one configuration job: connect, send the block, always close.
    pub fn apply(&mut self, job: &str, commands: &str, timeout: Duration) -> Result<String, ApplyError> {
        info!(device = %self.record.name, host = %self.record.ip, "Starting {} configuration", job);

        let result = self.connect_and_send(commands, timeout);

        match &result {
            Ok(_) => info!(device = %self.record.name, "{} configuration completed", job),
            Err(e) => error!(device = %self.record.name, "Error during {} configuration: {}", job, e),
        }

        info!(device = %self.record.name, host = %self.record.ip, "Closing connection to device");
        self.session.close();
        result
    }

    fn connect_and_send(&mut self, commands: &str, timeout: Duration) -> Result<String, ApplyError> {
        self.session.connect(&self.record.privileged_password, timeout)?;
        Ok(self.session.send(commands)?)
    }
}
