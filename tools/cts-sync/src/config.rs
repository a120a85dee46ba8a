//! Persisted client configuration
//!
//! Stored as pretty-printed JSON. A missing or unreadable file is replaced
//! with defaults so the first run always starts from a valid config.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Watch picked on an earlier run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownDevice {
    pub name: String,
    /// Colon-separated Bluetooth address, e.g. `AA:BB:CC:DD:EE:FF`
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub last_device: Option<KnownDevice>,
    /// Seconds between scans for the remembered watch
    pub scan_interval: u64,
    /// Seconds between time writes
    pub sync_interval: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            last_device: None,
            scan_interval: 300,
            sync_interval: 1800,
        }
    }
}

impl SyncConfig {
    /// Read `path`, or write and return the defaults if it cannot be used
    pub fn load_or_create(path: &Path) -> Result<Self, SyncError> {
        match Self::load(path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Config {} unusable ({}), writing defaults", path.display(), e);
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write as JSON with four-space indentation
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');
        fs::write(path, out)?;
        Ok(())
    }

    /// Scan period, never shorter than one second
    pub fn scan_period(&self) -> Duration {
        Duration::from_secs(self.scan_interval.max(1))
    }

    /// Sync period, never shorter than one second
    pub fn sync_period(&self) -> Duration {
        Duration::from_secs(self.sync_interval.max(1))
    }
}
