#![deny(unsafe_code)]
//! Current Time Service characteristic encoding
//!
//! Bit-exact layouts of the three CTS records. All functions are pure.
//!
//! | Record | Size | Layout |
//! |---|---|---|
//! | Current Time | 10 | year (u16 LE), month, day, hour, minute, second, day of week, fractions256, adjust reason |
//! | Local Time Information | 2 | time zone (i8, 15 min units), DST offset |
//! | Reference Time Information | 4 | source, accuracy, days since update, hours since update |

use crate::datetime::DateTime;
use crate::error::CtsError;

/// 16-bit UUIDs assigned by the Bluetooth SIG
pub mod uuid {
    /// Current Time Service
    pub const CURRENT_TIME_SERVICE: u16 = 0x1805;
    /// Current Time characteristic (read, notify, write)
    pub const CURRENT_TIME: u16 = 0x2A2B;
    /// Local Time Information characteristic (read)
    pub const LOCAL_TIME_INFO: u16 = 0x2A0F;
    /// Reference Time Information characteristic (read)
    pub const REFERENCE_TIME_INFO: u16 = 0x2A14;

    /// Expand a 16-bit UUID over the Bluetooth base UUID
    /// `0000xxxx-0000-1000-8000-00805F9B34FB`, big-endian byte order
    pub const fn to_uuid128(short: u16) -> [u8; 16] {
        let [hi, lo] = short.to_be_bytes();
        [
            0x00, 0x00, hi, lo, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0x80, 0x5F, 0x9B, 0x34,
            0xFB,
        ]
    }
}

pub const CURRENT_TIME_LEN: usize = 10;
pub const LOCAL_TIME_INFO_LEN: usize = 2;
pub const REFERENCE_TIME_INFO_LEN: usize = 4;

/// Why the clock was last adjusted (bit field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdjustReason(pub u8);

impl AdjustReason {
    pub const NONE: Self = Self(0);
    pub const MANUAL_TIME_UPDATE: Self = Self(1 << 0);
    pub const EXTERNAL_REFERENCE_TIME_UPDATE: Self = Self(1 << 1);
    pub const CHANGE_OF_TIME_ZONE: Self = Self(1 << 2);
    pub const CHANGE_OF_DST: Self = Self(1 << 3);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for AdjustReason {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Daylight saving offset codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DstOffset {
    Standard = 0,
    HalfHourDaylight = 2,
    Daylight = 4,
    DoubleDaylight = 8,
    Unknown = 255,
}

/// Reference time source codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimeSource {
    Unknown = 0,
    NetworkTimeProtocol = 1,
    Gps = 2,
    RadioTimeSignal = 3,
    Manual = 4,
    AtomicClock = 5,
    CellularNetwork = 6,
}

/// Static local time configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalTimeInfo {
    /// Offset from UTC in 15-minute steps (-48..=56), -128 = unknown
    pub time_zone: i8,
    pub dst_offset: DstOffset,
}

impl Default for LocalTimeInfo {
    /// UTC+8, standard time
    fn default() -> Self {
        Self {
            time_zone: 32,
            dst_offset: DstOffset::Standard,
        }
    }
}

/// Static reference time configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReferenceTimeInfo {
    pub source: TimeSource,
    /// Drift since last update in 1/8 s steps; 254 = more than 31.625 s, 255 = unknown
    pub accuracy: u8,
}

impl Default for ReferenceTimeInfo {
    fn default() -> Self {
        Self {
            source: TimeSource::Manual,
            accuracy: 254,
        }
    }
}

/// Decoded Current Time record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentTime {
    pub date_time: DateTime,
    pub fractions256: u8,
    pub adjust_reason: AdjustReason,
}

/// Encode the Current Time record; fractions256 is always 0
pub fn encode_current_time(dt: &DateTime, reason: AdjustReason) -> [u8; CURRENT_TIME_LEN] {
    let mut buf = [0u8; CURRENT_TIME_LEN];
    buf[0..2].copy_from_slice(&dt.year.to_le_bytes());
    buf[2] = dt.month;
    buf[3] = dt.day;
    buf[4] = dt.hour;
    buf[5] = dt.minute;
    buf[6] = dt.second;
    buf[7] = dt.day_of_week;
    buf[8] = 0;
    buf[9] = reason.bits();
    buf
}

/// Decode and range check a Current Time record
///
/// The payload must be exactly [`CURRENT_TIME_LEN`] bytes. Field ranges
/// are checked with [`DateTime::validate`].
pub fn decode_current_time(data: &[u8]) -> Result<CurrentTime, CtsError> {
    let data: &[u8; CURRENT_TIME_LEN] =
        data.try_into().map_err(|_| CtsError::MalformedPayload {
            expected: CURRENT_TIME_LEN,
            actual: data.len(),
        })?;

    let date_time = DateTime {
        year: u16::from_le_bytes([data[0], data[1]]),
        month: data[2],
        day: data[3],
        hour: data[4],
        minute: data[5],
        second: data[6],
        day_of_week: data[7],
    };
    date_time.validate()?;

    Ok(CurrentTime {
        date_time,
        fractions256: data[8],
        adjust_reason: AdjustReason(data[9]),
    })
}

pub fn encode_local_time_info(info: &LocalTimeInfo) -> [u8; LOCAL_TIME_INFO_LEN] {
    [info.time_zone as u8, info.dst_offset as u8]
}

/// Days and hours since update are not tracked and always encode as 0
pub fn encode_reference_time_info(info: &ReferenceTimeInfo) -> [u8; REFERENCE_TIME_INFO_LEN] {
    [info.source as u8, info.accuracy, 0, 0]
}
