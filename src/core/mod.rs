//! Core device session components.
//!
//! - **transport**: traits over the SSH connection, shell channel and clock
//! - **ssh**: libssh2 implementation of the transport traits
//! - **session**: connect / elevate / send / close lifecycle for one device
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Credentials
//! ├── Backend
//! │   ├── Connector (SshConnector)
//! │   ├── Clock (settle delays)
//! │   └── SettleDelays
//! └── Link (only while connected)
//!     ├── Transport
//!     └── Channel
//! ```

pub mod session;
pub mod ssh;
pub mod transport;

#[cfg(test)]
pub mod testing;
