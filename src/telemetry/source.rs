//! TelemetrySource and the sensor drivers behind it

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::errors::{Channel, SensorError, SensorResult};
use super::reading::Reading;

/// Produces one reading per tick.
pub trait TelemetrySource {
    /// Samples every channel. Any channel failure fails the whole sample.
    fn sample(&mut self) -> SensorResult<Reading>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn sample(&mut self) -> SensorResult<Reading> {
        (**self).sample()
    }
}

/// Temperature and humidity from one part (DHT11-style).
pub trait ClimateSensor {
    /// Degrees Celsius
    fn read_temperature(&mut self) -> SensorResult<f32>;
    /// Relative humidity in percent
    fn read_humidity(&mut self) -> SensorResult<f32>;
}

/// Ambient light level (BH1750-style).
pub trait LightSensor {
    fn read_lux(&mut self) -> SensorResult<f32>;
}

/// Converts a BH1750 raw count in continuous high-resolution mode to lux.
pub fn bh1750_raw_to_lux(raw: u16) -> f32 {
    f32::from(raw) / 1.2
}

/// A climate sensor and a light sensor sampled together.
pub struct SensorSuite<C, L> {
    climate: C,
    light: L,
}

impl<C: ClimateSensor, L: LightSensor> SensorSuite<C, L> {
    pub fn new(climate: C, light: L) -> Self {
        Self { climate, light }
    }
}

impl<C: ClimateSensor, L: LightSensor> TelemetrySource for SensorSuite<C, L> {
    fn sample(&mut self) -> SensorResult<Reading> {
        let temperature = self.climate.read_temperature()?;
        let humidity = self.climate.read_humidity()?;
        let illuminance = self.light.read_lux()?;
        Reading::new(temperature, humidity, illuminance)
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn fails(rng: &mut StdRng, probability: f64) -> bool {
    probability > 0.0 && rng.gen_bool(probability.min(1.0))
}

/// Random-walk climate sensor for host runs.
pub struct SimulatedClimate {
    rng: StdRng,
    temperature: f32,
    humidity: f32,
    failure_probability: f64,
}

impl SimulatedClimate {
    pub fn new(seed: Option<u64>, failure_probability: f64) -> Self {
        Self {
            rng: rng_from(seed),
            temperature: 21.0,
            humidity: 45.0,
            failure_probability,
        }
    }
}

impl ClimateSensor for SimulatedClimate {
    fn read_temperature(&mut self) -> SensorResult<f32> {
        if fails(&mut self.rng, self.failure_probability) {
            return Err(SensorError::ReadFailed {
                channel: Channel::Temperature,
                reason: "checksum mismatch on sensor bus".to_string(),
            });
        }
        self.temperature = (self.temperature + self.rng.gen_range(-0.5f32..=0.5)).clamp(-40.0, 80.0);
        Ok(self.temperature)
    }

    fn read_humidity(&mut self) -> SensorResult<f32> {
        if fails(&mut self.rng, self.failure_probability) {
            return Err(SensorError::ReadFailed {
                channel: Channel::Humidity,
                reason: "checksum mismatch on sensor bus".to_string(),
            });
        }
        self.humidity = (self.humidity + self.rng.gen_range(-2.0f32..=2.0)).clamp(0.0, 100.0);
        Ok(self.humidity)
    }
}

/// Light sensor producing raw counts around a drifting level.
pub struct SimulatedLight {
    rng: StdRng,
    raw: u16,
    failure_probability: f64,
}

impl SimulatedLight {
    pub fn new(seed: Option<u64>, failure_probability: f64) -> Self {
        Self {
            // offset so the two sensors don't share a stream under one seed
            rng: rng_from(seed.map(|s| s.wrapping_add(1))),
            raw: 360,
            failure_probability,
        }
    }
}

impl LightSensor for SimulatedLight {
    fn read_lux(&mut self) -> SensorResult<f32> {
        if fails(&mut self.rng, self.failure_probability) {
            return Err(SensorError::ReadFailed {
                channel: Channel::Illuminance,
                reason: "no acknowledge on i2c".to_string(),
            });
        }
        let step: i32 = self.rng.gen_range(-40..=40);
        self.raw = (i32::from(self.raw) + step).clamp(0, i32::from(u16::MAX)) as u16;
        Ok(bh1750_raw_to_lux(self.raw))
    }
}

/// Simulated suite used by the CLI
pub type SimulatedSensors = SensorSuite<SimulatedClimate, SimulatedLight>;

impl SimulatedSensors {
    pub fn simulated(seed: Option<u64>, failure_probability: f64) -> Self {
        SensorSuite::new(
            SimulatedClimate::new(seed, failure_probability),
            SimulatedLight::new(seed, failure_probability),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClimate(f32, f32);

    impl ClimateSensor for FixedClimate {
        fn read_temperature(&mut self) -> SensorResult<f32> {
            Ok(self.0)
        }
        fn read_humidity(&mut self) -> SensorResult<f32> {
            Ok(self.1)
        }
    }

    struct RawLight(u16);

    impl LightSensor for RawLight {
        fn read_lux(&mut self) -> SensorResult<f32> {
            Ok(bh1750_raw_to_lux(self.0))
        }
    }

    struct DeadLight;

    impl LightSensor for DeadLight {
        fn read_lux(&mut self) -> SensorResult<f32> {
            Err(SensorError::ReadFailed {
                channel: Channel::Illuminance,
                reason: "unplugged".into(),
            })
        }
    }

    #[test]
    fn test_bh1750_conversion() {
        assert_eq!(bh1750_raw_to_lux(0), 0.0);
        assert!((bh1750_raw_to_lux(120) - 100.0).abs() < 0.001);
        assert!((bh1750_raw_to_lux(u16::MAX) - 54612.5).abs() < 0.01);
    }

    #[test]
    fn test_suite_combines_channels() {
        let mut suite = SensorSuite::new(FixedClimate(22.0, 51.0), RawLight(600));
        let reading = suite.sample().unwrap();
        assert_eq!(reading.to_payload(), "{t:22.00,h:51.00,l:500.00}");
    }

    #[test]
    fn test_suite_fails_when_one_channel_fails() {
        let mut suite = SensorSuite::new(FixedClimate(22.0, 51.0), DeadLight);
        let err = suite.sample().unwrap_err();
        assert_eq!(err.channel(), Channel::Illuminance);
    }

    #[test]
    fn test_suite_rejects_nan_from_driver() {
        let mut suite = SensorSuite::new(FixedClimate(f32::NAN, 51.0), RawLight(1));
        assert!(matches!(
            suite.sample(),
            Err(SensorError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_simulated_suite_is_deterministic_under_seed() {
        let mut a = SimulatedSensors::simulated(Some(7), 0.0);
        let mut b = SimulatedSensors::simulated(Some(7), 0.0);
        for _ in 0..10 {
            let ra = a.sample().unwrap();
            let rb = b.sample().unwrap();
            assert_eq!(ra.to_payload(), rb.to_payload());
        }
    }

    #[test]
    fn test_simulated_values_stay_in_range() {
        let mut suite = SimulatedSensors::simulated(Some(42), 0.0);
        for _ in 0..500 {
            let r = suite.sample().unwrap();
            assert!((-40.0..=80.0).contains(&r.temperature));
            assert!((0.0..=100.0).contains(&r.humidity));
            assert!(r.illuminance >= 0.0);
        }
    }

    #[test]
    fn test_simulated_failure_probability_one_always_fails() {
        let mut suite = SimulatedSensors::simulated(Some(1), 1.0);
        assert!(suite.sample().is_err());
    }
}
