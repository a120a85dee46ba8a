//! Hardware abstraction traits for the wall-clock firmware
//!
//! This crate defines the seams between the platform-agnostic service in
//! `cts-core` and a board. BSPs implement these traits:
//!
//! - **`ble`**: `BlePeripheral`, the GATT server / advertising collaborator,
//!   and the `LinkEvent` values it delivers
//! - **`indicator`**: `StatusIndicator`, the idle/connected status light

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod ble;
pub mod indicator;

pub use ble::{BlePeripheral, LinkEvent, PeerAddress, WritePayload, MAX_WRITE_LEN};
pub use indicator::{PinIndicator, StatusIndicator};
