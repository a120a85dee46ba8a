#![deny(unsafe_code)]
//! Characteristic publishing
//!
//! Encode clock and metadata records and hand them to the BLE stack.

use hal_abstractions::BlePeripheral;

use crate::codec::{self, uuid};
use crate::config::CtsConfig;
use crate::datetime::DateTime;
use crate::error::CtsError;

fn write<P: BlePeripheral>(peripheral: &mut P, id: u16, value: &[u8]) -> Result<(), CtsError> {
    peripheral.write_characteristic(id, value).map_err(|e| {
        warn!("Write of {:#x} failed: {:?}", id, e);
        CtsError::WriteRejected
    })
}

/// Publish the Current Time characteristic
pub fn current_time<P: BlePeripheral>(
    peripheral: &mut P,
    now: &DateTime,
    config: &CtsConfig,
) -> Result<(), CtsError> {
    let value = codec::encode_current_time(now, config.adjust_reason);
    write(peripheral, uuid::CURRENT_TIME, &value)
}

/// Publish all three characteristics
///
/// Every record is attempted even if an earlier one fails; the first
/// failure is returned.
pub fn snapshot<P: BlePeripheral>(
    peripheral: &mut P,
    now: &DateTime,
    config: &CtsConfig,
) -> Result<(), CtsError> {
    let current = current_time(peripheral, now, config);
    let local = write(
        peripheral,
        uuid::LOCAL_TIME_INFO,
        &codec::encode_local_time_info(&config.local_time_info),
    );
    let reference = write(
        peripheral,
        uuid::REFERENCE_TIME_INFO,
        &codec::encode_reference_time_info(&config.reference_time_info),
    );
    current.and(local).and(reference)
}
