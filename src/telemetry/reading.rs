//! Reading and its wire payload
//!
//! Payload format, one message per reading:
//!
//! ```text
//! {t:<temperature>,h:<humidity>,l:<illuminance>}
//! ```
//!
//! Values carry two decimals, e.g. `{t:21.50,h:40.00,l:312.50}`. Keys are
//! unquoted, so this is not JSON; consumers parse it as `key:value` pairs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::{Channel, SensorError};

/// One sample of all three channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// Degrees Celsius
    pub temperature: f32,
    /// Relative humidity, percent
    pub humidity: f32,
    /// Lux
    pub illuminance: f32,
    /// When the sample was taken; not part of the payload
    pub sampled_at: DateTime<Utc>,
}

impl Reading {
    /// Builds a reading, rejecting non-finite channel values.
    pub fn new(temperature: f32, humidity: f32, illuminance: f32) -> Result<Self, SensorError> {
        Self::at(temperature, humidity, illuminance, Utc::now())
    }

    /// Builds a reading with an explicit timestamp.
    pub fn at(
        temperature: f32,
        humidity: f32,
        illuminance: f32,
        sampled_at: DateTime<Utc>,
    ) -> Result<Self, SensorError> {
        check(Channel::Temperature, temperature)?;
        check(Channel::Humidity, humidity)?;
        check(Channel::Illuminance, illuminance)?;
        Ok(Self {
            temperature,
            humidity,
            illuminance,
            sampled_at,
        })
    }

    /// Serialized payload string.
    pub fn to_payload(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{t:{:.2},h:{:.2},l:{:.2}}}",
            self.temperature, self.humidity, self.illuminance
        )
    }
}

fn check(channel: Channel, value: f32) -> Result<(), SensorError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SensorError::InvalidValue { channel, value })
    }
}
