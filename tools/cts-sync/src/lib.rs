//! Host-side Current Time Service client
//!
//! Finds a watch advertising the Current Time Service, remembers it in a
//! JSON config file, and periodically writes the host's local time to its
//! Current Time characteristic. Record encoding and decoding come from
//! `cts-core`, so host and firmware agree on the wire format.
//!
//! - **`config`**: persisted device choice and loop intervals
//! - **`discovery`**: picking a device out of a scan
//! - **`host_time`**: local clock to Current Time record and back
//! - **`central`**: BlueZ scan, connect, write and read back (`bluez` feature)

pub mod config;
pub mod discovery;
pub mod error;
pub mod host_time;

#[cfg(feature = "bluez")]
pub mod central;

pub use config::{KnownDevice, SyncConfig};
pub use error::SyncError;
