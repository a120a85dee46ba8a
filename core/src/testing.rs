//! Test doubles for the BLE peripheral and status light

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use hal_abstractions::{BlePeripheral, LinkEvent, PeerAddress, StatusIndicator};

pub const PEER_A: PeerAddress = PeerAddress::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
pub const PEER_B: PeerAddress = PeerAddress::new([0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Records every call; failure switches simulate stack errors
#[derive(Default)]
pub struct MockPeripheral {
    pub events: VecDeque<LinkEvent>,
    pub writes: Vec<(u16, Vec<u8>)>,
    pub advertising: bool,
    pub advertising_calls: Vec<&'static str>,
    /// Set when start is issued while already advertising
    pub double_start: bool,
    pub fail_writes: bool,
    pub fail_start_advertising: bool,
}

impl MockPeripheral {
    pub fn writes_to(&self, uuid: u16) -> usize {
        self.writes.iter().filter(|(id, _)| *id == uuid).count()
    }

    pub fn last_value(&self, uuid: u16) -> Option<Vec<u8>> {
        self.writes
            .iter()
            .rev()
            .find(|(id, _)| *id == uuid)
            .map(|(_, v)| v.clone())
    }
}

impl BlePeripheral for MockPeripheral {
    type Error = MockError;

    fn poll_event(&mut self) -> Option<LinkEvent> {
        self.events.pop_front()
    }

    fn write_characteristic(&mut self, uuid: u16, value: &[u8]) -> Result<(), MockError> {
        if self.fail_writes {
            return Err(MockError);
        }
        self.writes.push((uuid, value.to_vec()));
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), MockError> {
        self.advertising_calls.push("stop");
        self.advertising = false;
        Ok(())
    }

    fn start_advertising(&mut self) -> Result<(), MockError> {
        self.advertising_calls.push("start");
        if self.fail_start_advertising {
            return Err(MockError);
        }
        if self.advertising {
            self.double_start = true;
        }
        self.advertising = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockIndicator {
    pub on: bool,
    pub toggles: usize,
}

impl StatusIndicator for MockIndicator {
    fn set(&mut self, on: bool) {
        self.on = on;
    }

    fn toggle(&mut self) {
        self.on = !self.on;
        self.toggles += 1;
    }
}
