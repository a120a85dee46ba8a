#![deny(unsafe_code)]
//! Service configuration structures

use heapless::String;

use crate::codec::{AdjustReason, LocalTimeInfo, ReferenceTimeInfo};
use crate::datetime::DateTime;

/// Maximum advertised device name length
pub const DEVICE_NAME_MAX_LEN: usize = 20;

/// Name advertised when the board does not configure one
pub const DEFAULT_DEVICE_NAME: &str = "S&B Watch";

const _: () = assert!(DEFAULT_DEVICE_NAME.len() <= DEVICE_NAME_MAX_LEN);

/// Task periods in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskPeriods {
    /// Drain BLE notifications
    pub link_poll_ms: u64,
    /// Advance the calendar clock
    pub tick_ms: u64,
    /// Re-publish Current Time while connected
    pub push_ms: u64,
    /// Toggle the idle indicator while disconnected
    pub indicator_ms: u64,
    /// Log the system time
    pub report_ms: u64,
}

impl Default for TaskPeriods {
    fn default() -> Self {
        Self {
            link_poll_ms: 5,
            tick_ms: 1000,
            push_ms: 1500,
            indicator_ms: 1000,
            report_ms: 5000,
        }
    }
}

/// Current Time Service configuration
#[derive(Debug, Clone)]
pub struct CtsConfig {
    /// GAP device name and advertised local name
    pub device_name: String<DEVICE_NAME_MAX_LEN>,
    /// Clock value at power-on
    pub initial_time: DateTime,
    pub local_time_info: LocalTimeInfo,
    pub reference_time_info: ReferenceTimeInfo,
    /// Adjust reason reported in every Current Time encode
    pub adjust_reason: AdjustReason,
    pub periods: TaskPeriods,
    /// Upper bound on notifications handled per link poll
    pub max_events_per_poll: usize,
}

impl Default for CtsConfig {
    fn default() -> Self {
        let device_name = String::try_from(DEFAULT_DEVICE_NAME).unwrap_or_default();
        Self {
            device_name,
            initial_time: DateTime::EPOCH,
            local_time_info: LocalTimeInfo::default(),
            reference_time_info: ReferenceTimeInfo::default(),
            adjust_reason: AdjustReason::MANUAL_TIME_UPDATE,
            periods: TaskPeriods::default(),
            max_events_per_poll: 8,
        }
    }
}

/// Advertising and connection parameters requested from the BLE stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingConfig {
    /// Advertising interval in 0.625 ms units
    pub interval: u32,
    /// Minimum connection interval in 1.25 ms units
    pub conn_interval_min: u16,
    /// Maximum connection interval in 1.25 ms units
    pub conn_interval_max: u16,
    pub slave_latency: u16,
    /// Supervision timeout in 10 ms units
    pub supervision_timeout: u16,
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        Self {
            interval: 320,            // 200 ms
            conn_interval_min: 0x0018, // 30 ms
            conn_interval_max: 0x0030, // 60 ms
            slave_latency: 0,
            supervision_timeout: 400, // 4 s
        }
    }
}
