#![deny(unsafe_code)]
//! Current Time Service error types

/// Current Time field that failed range validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Month,
    Day,
    Hour,
    Minute,
    Second,
    DayOfWeek,
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Month => write!(f, "month"),
            Self::Day => write!(f, "day"),
            Self::Hour => write!(f, "hour"),
            Self::Minute => write!(f, "minute"),
            Self::Second => write!(f, "second"),
            Self::DayOfWeek => write!(f, "day of week"),
        }
    }
}

/// Current Time Service operation errors
///
/// None of these are fatal. Decode and validation failures leave the clock
/// untouched; transport failures are retried by the next periodic push or
/// left to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CtsError {
    /// Characteristic payload has the wrong length
    MalformedPayload { expected: usize, actual: usize },
    /// Decoded field outside its valid range
    OutOfRangeField(Field),
    /// BLE stack refused a characteristic update
    WriteRejected,
    /// Advertising could not be resumed after a disconnect
    DiscoverabilityRestartFailed,
}

impl core::fmt::Display for CtsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MalformedPayload { expected, actual } => {
                write!(f, "Malformed payload: expected {} bytes, got {}", expected, actual)
            }
            Self::OutOfRangeField(field) => write!(f, "Field out of range: {}", field),
            Self::WriteRejected => write!(f, "Characteristic write rejected"),
            Self::DiscoverabilityRestartFailed => write!(f, "Failed to restart advertising"),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for CtsError {}
