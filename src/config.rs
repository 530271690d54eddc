//! Node configuration
//!
//! Loaded from a single JSON file. Only `store_path` is required; every
//! other key falls back to the firmware defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connectivity::{LinkProfile, RetryPolicy};
use crate::flush::DrainPolicy;
use crate::observability::Severity;
use crate::record_log::{Layout, LogOptions, DEFAULT_MAX_SLOTS, DEFAULT_STORAGE_SIZE};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for this schema
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range
    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Node configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Path of the storage image file (required)
    pub store_path: PathBuf,

    #[serde(default = "default_storage_size")]
    pub storage_size: usize,

    #[serde(default = "default_max_slots")]
    pub max_slots: usize,

    /// Zero the store at every boot
    #[serde(default)]
    pub erase_on_boot: bool,

    /// Erase and continue when the stored header is corrupt
    #[serde(default = "default_true")]
    pub recover_corrupt_log: bool,

    #[serde(default)]
    pub drain_policy: DrainPolicy,

    /// Publish topic
    #[serde(default = "default_feed")]
    pub feed: String,

    #[serde(default = "default_attempts")]
    pub publish_attempts: u32,

    #[serde(default = "default_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Delay before each tick
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_log_level")]
    pub log_level: Severity,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Host simulation knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed for every random source; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_offline_probability")]
    pub offline_probability: f64,

    #[serde(default = "default_publish_failure_probability")]
    pub publish_failure_probability: f64,

    #[serde(default)]
    pub sensor_failure_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            offline_probability: default_offline_probability(),
            publish_failure_probability: default_publish_failure_probability(),
            sensor_failure_probability: 0.0,
        }
    }
}

fn default_storage_size() -> usize {
    DEFAULT_STORAGE_SIZE
}
fn default_max_slots() -> usize {
    DEFAULT_MAX_SLOTS
}
fn default_true() -> bool {
    true
}
fn default_feed() -> String {
    "station/weather".to_string()
}
fn default_attempts() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    5000
}
fn default_tick_interval_ms() -> u64 {
    10000
}
fn default_log_level() -> Severity {
    Severity::Info
}
fn default_offline_probability() -> f64 {
    0.3
}
fn default_publish_failure_probability() -> f64 {
    0.05
}

impl NodeConfig {
    /// Config with defaults for everything but the store path
    pub fn with_store_path(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            storage_size: default_storage_size(),
            max_slots: default_max_slots(),
            erase_on_boot: false,
            recover_corrupt_log: true,
            drain_policy: DrainPolicy::default(),
            feed: default_feed(),
            publish_attempts: default_attempts(),
            connect_attempts: default_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            log_level: default_log_level(),
            simulation: SimulationConfig::default(),
        }
    }

    /// Reads, parses and validates a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses and validates config JSON.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: NodeConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_slots == 0 {
            return Err(ConfigError::invalid("max_slots", "must be > 0"));
        }

        Layout::new(self.storage_size, self.max_slots)
            .map_err(|e| ConfigError::invalid("storage_size", e.message()))?;

        if self.feed.is_empty() {
            return Err(ConfigError::invalid("feed", "must not be empty"));
        }
        if self.publish_attempts == 0 {
            return Err(ConfigError::invalid("publish_attempts", "must be > 0"));
        }
        if self.connect_attempts == 0 {
            return Err(ConfigError::invalid("connect_attempts", "must be > 0"));
        }

        let sim = &self.simulation;
        check_probability("simulation.offline_probability", sim.offline_probability)?;
        check_probability(
            "simulation.publish_failure_probability",
            sim.publish_failure_probability,
        )?;
        check_probability(
            "simulation.sensor_failure_probability",
            sim.sensor_failure_probability,
        )?;

        Ok(())
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            max_slots: self.max_slots,
            erase_on_boot: self.erase_on_boot,
            reset_on_corruption: self.recover_corrupt_log,
        }
    }

    pub fn connect_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.connect_attempts, self.retry_backoff())
    }

    pub fn publish_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.publish_attempts, self.retry_backoff())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn link_profile(&self) -> LinkProfile {
        LinkProfile {
            offline_probability: self.simulation.offline_probability,
            publish_failure_probability: self.simulation.publish_failure_probability,
        }
    }
}

fn check_probability(key: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("{} is not in [0, 1]", value)))
    }
}
