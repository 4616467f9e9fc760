//! Device inventory
//!
//! A JSON array of device records:
//!
//! ```json
//! [
//!   {
//!     "name": "R1",
//!     "ip": "192.168.1.1",
//!     "username": "admin",
//!     "password": "cisco",
//!     "privileged_password": "class",
//!     "type": "router"
//!   }
//! ]
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("inventory file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inventory file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Device family, decides which configuration menu applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Router,
    Switch,
}

/// One inventory entry. Immutable once loaded.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub ip: String,
    pub username: String,
    pub password: String,
    pub privileged_password: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl DeviceRecord {
    /// Classify by the `type` tag: `router` wins over `sw`
    pub fn class(&self) -> Option<DeviceClass> {
        let kind = self.kind.to_lowercase();
        if kind.contains("router") {
            Some(DeviceClass::Router)
        } else if kind.contains("sw") {
            Some(DeviceClass::Switch)
        } else {
            None
        }
    }

    /// Multilayer switches are recognised by name
    pub fn is_multilayer(&self) -> bool {
        self.name.to_lowercase().contains("multilayer")
    }
}

impl fmt::Debug for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRecord")
            .field("name", &self.name)
            .field("ip", &self.ip)
            .field("username", &self.username)
            .field("type", &self.kind)
            .finish_non_exhaustive()
    }
}

/// All devices known to the tool
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: Vec<DeviceRecord>,
}

impl Inventory {
    #[allow(dead_code)]
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        Self { devices }
    }

    /// Load the inventory from a JSON file
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let content = fs::read_to_string(path).map_err(|source| {
            error!("Inventory file {} not found or unreadable", path.display());
            InventoryError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let devices: Vec<DeviceRecord> = serde_json::from_str(&content).map_err(|source| {
            error!("Failed to parse {}, ensure it contains valid JSON", path.display());
            InventoryError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        info!("Loaded {} devices from {}", devices.len(), path.display());
        Ok(Self { devices })
    }

    pub fn find_by_ip(&self, ip: &str) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| d.ip == ip)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(name: &str, ip: &str, kind: &str) -> DeviceRecord {
    DeviceRecord {
        name: name.to_string(),
        ip: ip.to_string(),
        username: "admin".to_string(),
        password: "cisco".to_string(),
        privileged_password: "class".to_string(),
        kind: kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"name": "R1", "ip": "192.168.1.1", "username": "admin", "password": "cisco",
         "privileged_password": "class", "type": "Router"},
        {"name": "Multilayer-SW1", "ip": "192.168.1.2", "username": "admin", "password": "cisco",
         "privileged_password": "class", "type": "switch"}
    ]"#;

    #[test]
    fn test_load_and_find() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let inventory = Inventory::load(file.path()).unwrap();

        assert_eq!(inventory.len(), 2);
        let r1 = inventory.find_by_ip("192.168.1.1").unwrap();
        assert_eq!(r1.name, "R1");
        assert_eq!(r1.privileged_password, "class");
        assert!(inventory.find_by_ip("10.9.9.9").is_none());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Inventory::load(&dir.path().join("deviceDetails.json")).unwrap_err();
        assert!(matches!(err, InventoryError::Io { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[{\"name\": \"R1\"").unwrap();

        let err = Inventory::load(file.path()).unwrap_err();
        assert!(matches!(err, InventoryError::Parse { .. }));
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"name": "R1", "ip": "10.0.0.1"}]"#).unwrap();

        assert!(matches!(
            Inventory::load(file.path()),
            Err(InventoryError::Parse { .. })
        ));
    }

    #[test]
    fn test_device_class() {
        assert_eq!(record("R1", "1.1.1.1", "Router").class(), Some(DeviceClass::Router));
        assert_eq!(record("S1", "1.1.1.2", "switch").class(), Some(DeviceClass::Switch));
        assert_eq!(record("S2", "1.1.1.3", "L3-SW").class(), Some(DeviceClass::Switch));
        assert_eq!(record("F1", "1.1.1.4", "firewall").class(), None);
    }

    #[test]
    fn test_multilayer_by_name() {
        assert!(record("MultiLayer-SW1", "1.1.1.2", "switch").is_multilayer());
        assert!(!record("Access-SW1", "1.1.1.3", "switch").is_multilayer());
    }

    #[test]
    fn test_debug_hides_passwords() {
        let shown = format!("{:?}", record("R1", "1.1.1.1", "router"));
        assert!(shown.contains("R1"));
        assert!(!shown.contains("cisco"));
        assert!(!shown.contains("class"));
    }
}
