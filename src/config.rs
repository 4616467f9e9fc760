//! Configuration management for netcfg.
//!
//! Settings are read from `~/.netcfg/config.toml` (or a path given with
//! `--config`). Every field has a default, so the file is optional:
//!
//! ```toml
//! # Device inventory (JSON)
//! inventory = "deviceDetails.json"
//!
//! [ssh]
//! port = 22
//! connect_timeout_secs = 30
//!
//! # Fixed waits for the device CLI, in milliseconds
//! [settle]
//! shell_ms = 1000
//! escalate_ms = 2000
//! command_ms = 2000
//!
//! [dhcp]
//! dns_server = "8.8.8.8"
//!
//! [ui]
//! color = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::core::session::{SettleDelays, DEFAULT_CONNECT_TIMEOUT};
use crate::core::ssh::DEFAULT_PORT;

/// Floor for `ssh.connect_timeout_secs`
const MIN_CONNECT_TIMEOUT_SECS: u64 = 1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device inventory file
    pub inventory: PathBuf,
    /// SSH settings
    pub ssh: SshConfig,
    /// Settle delays
    pub settle: SettleConfig,
    /// DHCP defaults
    pub dhcp: DhcpConfig,
    /// Terminal output
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inventory: PathBuf::from("deviceDetails.json"),
            ssh: SshConfig::default(),
            settle: SettleConfig::default(),
            dhcp: DhcpConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

/// SSH configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub port: u16,
    pub connect_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
        }
    }
}

/// Settle delay configuration (milliseconds)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    pub shell_ms: u64,
    pub escalate_ms: u64,
    pub command_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            shell_ms: 1000,
            escalate_ms: 2000,
            command_ms: 2000,
        }
    }
}

/// DHCP configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DhcpConfig {
    pub dns_server: String,
}

impl Default for DhcpConfig {
    fn default() -> Self {
        Self {
            dns_server: "8.8.8.8".to_string(),
        }
    }
}

/// Terminal output configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub color: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    /// Lenient load: a missing file is silent, a broken one is logged
    fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        app_dir().map(|dir| dir.join("config.toml"))
    }

    /// At least one second; a zero timeout is rejected by the TCP connect
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh.connect_timeout_secs.max(MIN_CONNECT_TIMEOUT_SECS))
    }

    pub fn settle_delays(&self) -> SettleDelays {
        SettleDelays {
            shell: Duration::from_millis(self.settle.shell_ms),
            escalate: Duration::from_millis(self.settle.escalate_ms),
            command: Duration::from_millis(self.settle.command_ms),
        }
    }
}

/// `~/.netcfg`, created on first use
pub fn app_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(".netcfg");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
