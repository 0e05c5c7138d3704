//! Sensor error types and handling

use crate::core::NO_HEADING_DATA;

/// Failures surfaced by location and orientation sensors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocateError {
    /// The platform has no such capability at all
    #[error("Geolocation is not supported on this device")]
    Unsupported,

    /// User or platform refused sensor access
    #[error("Permission to use the sensor was denied")]
    PermissionDenied,

    /// No usable reading arrived within the bound
    #[error("No position received after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    /// The underlying stream reported a fatal condition
    #[error("Sensor error {code}: {message}")]
    Sensor { code: u16, message: String },

    /// A single orientation tick had nothing usable; transient
    #[error("{}", NO_HEADING_DATA)]
    NoReading,
}

/// Result type for sensor operations
pub type LocateResult<T> = Result<T, LocateError>;

impl LocateError {
    pub fn sensor(code: u16, message: impl Into<String>) -> Self {
        LocateError::Sensor {
            code,
            message: message.into(),
        }
    }

    /// Short status line suitable for showing to the user
    pub fn status_message(&self) -> String {
        match self {
            LocateError::Unsupported => "Location not available on this device".to_string(),
            LocateError::PermissionDenied => "Location permission denied".to_string(),
            LocateError::Timeout { .. } => "Could not get a position in time".to_string(),
            LocateError::Sensor { message, .. } => format!("Location error: {}", message),
            LocateError::NoReading => NO_HEADING_DATA.to_string(),
        }
    }
}
