//! Sensor error types

use std::fmt;

use thiserror::Error;

/// Measurement channel of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Temperature,
    Humidity,
    Illuminance,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Illuminance => "illuminance",
        };
        write!(f, "{}", name)
    }
}

/// A reading could not be obtained
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    /// The driver returned a value that is not a number
    #[error("{channel} reading is not finite: {value}")]
    InvalidValue { channel: Channel, value: f32 },

    /// The driver did not answer
    #[error("{channel} sensor read failed: {reason}")]
    ReadFailed { channel: Channel, reason: String },
}

impl SensorError {
    /// Channel that failed
    pub fn channel(&self) -> Channel {
        match self {
            SensorError::InvalidValue { channel, .. } | SensorError::ReadFailed { channel, .. } => {
                *channel
            }
        }
    }
}

/// Result type for sensor reads
pub type SensorResult<T> = Result<T, SensorError>;
