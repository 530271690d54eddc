//! Sensor sampling
//!
//! A `TelemetrySource` yields one `Reading` per tick; the reading renders to
//! the payload string that is either published live or stored in the record
//! log.

mod errors;
mod reading;
mod source;

pub use errors::{Channel, SensorError, SensorResult};
pub use reading::Reading;
pub use source::{
    bh1750_raw_to_lux, ClimateSensor, LightSensor, SensorSuite, SimulatedClimate, SimulatedLight,
    SimulatedSensors, TelemetrySource,
};
