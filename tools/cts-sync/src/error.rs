//! Sync client errors

use cts_core::CtsError;

#[derive(Debug)]
pub enum SyncError {
    /// Config file could not be read or written
    Io(std::io::Error),
    /// Config file is not valid JSON for [`crate::SyncConfig`]
    Json(serde_json::Error),
    /// Read-back record failed to decode
    Codec(CtsError),
    /// Host date cannot be expressed as a Current Time record
    UnrepresentableTime,
    /// Not a Bluetooth device address
    InvalidAddress(String),
    /// The watch exposes no Current Time characteristic
    CharacteristicNotFound,
    #[cfg(feature = "bluez")]
    Bluetooth(bluer::Error),
}

impl core::fmt::Display for SyncError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Config I/O error: {}", e),
            Self::Json(e) => write!(f, "Config format error: {}", e),
            Self::Codec(e) => write!(f, "Current Time record error: {}", e),
            Self::UnrepresentableTime => write!(f, "Host time does not fit a Current Time record"),
            Self::InvalidAddress(a) => write!(f, "Invalid device address: {}", a),
            Self::CharacteristicNotFound => write!(f, "Current Time characteristic not found"),
            #[cfg(feature = "bluez")]
            Self::Bluetooth(e) => write!(f, "Bluetooth error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            #[cfg(feature = "bluez")]
            Self::Bluetooth(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Io(e)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Json(e)
    }
}

impl From<CtsError> for SyncError {
    fn from(e: CtsError) -> Self {
        SyncError::Codec(e)
    }
}

#[cfg(feature = "bluez")]
impl From<bluer::Error> for SyncError {
    fn from(e: bluer::Error) -> Self {
        SyncError::Bluetooth(e)
    }
}
