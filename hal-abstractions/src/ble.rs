//! BLE peripheral abstraction
//!
//! The service never talks to a radio stack directly. A board wraps its
//! stack (SoftDevice, HCI host, simulator) in a type implementing
//! [`BlePeripheral`] and queues connection and write notifications as
//! [`LinkEvent`]s for the service to drain.

use core::fmt;

/// Largest characteristic write forwarded to the service
///
/// Default ATT MTU (23) minus the 3-byte ATT header. Longer writes are
/// truncated by the stack before they reach a `LinkEvent`.
pub const MAX_WRITE_LEN: usize = 20;

/// Raw bytes of a characteristic write
pub type WritePayload = heapless::Vec<u8, MAX_WRITE_LEN>;

/// 48-bit Bluetooth device address of a link peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress(pub [u8; 6]);

impl PeerAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

/// Formats most-significant byte first, the way addresses are printed by
/// phones and `bluetoothctl` (`AA:BB:CC:DD:EE:FF`)
impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

/// Notification delivered by the BLE stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A central connected
    Connected(PeerAddress),
    /// The link to a central dropped
    Disconnected(PeerAddress),
    /// A central wrote a characteristic, identified by its 16-bit UUID
    Written { uuid: u16, payload: WritePayload },
}

/// GATT server and advertising operations a board provides
///
/// All methods must return promptly: they are called from the cooperative
/// dispatch loop and any blocking delays every periodic task.
pub trait BlePeripheral {
    /// Stack-specific error
    #[cfg(not(feature = "defmt"))]
    type Error: fmt::Debug;
    /// Stack-specific error
    #[cfg(feature = "defmt")]
    type Error: fmt::Debug + defmt::Format;

    /// Pop the next pending notification, if any
    fn poll_event(&mut self) -> Option<LinkEvent>;

    /// Set a characteristic value, notifying subscribed centrals
    fn write_characteristic(&mut self, uuid: u16, value: &[u8]) -> Result<(), Self::Error>;

    /// Stop advertising
    ///
    /// Must succeed (or be a no-op) when not currently advertising.
    fn stop_advertising(&mut self) -> Result<(), Self::Error>;

    /// Start connectable advertising
    fn start_advertising(&mut self) -> Result<(), Self::Error>;
}
