//! Crash test harness for subprocess management
//!
//! - Writes a node config into a temp directory
//! - Runs `stationlog` with or without a crash point
//! - Reopens the storage image for post-crash checks

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use serde_json::json;
use stationlog::crash_point::CRASH_POINT_ENV;
use stationlog::record_log::RecordLog;
use stationlog::store::FileStore;
use tempfile::TempDir;

pub const CAPACITY: usize = 512;
pub const MAX_SLOTS: usize = 10;

/// Result of a subprocess run
#[derive(Debug)]
pub struct CrashTestResult {
    /// Whether the process died instead of exiting cleanly
    pub crashed: bool,
    pub exit_status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// A temp directory holding one node's config and storage image
pub struct NodeDir {
    dir: TempDir,
}

impl NodeDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("stationlog.json")
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("node.eeprom")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a config with no delays, a fixed seed and the given link state.
    pub fn write_config(&self, online: bool) {
        self.write_config_with(online, true);
    }

    /// Same as `write_config`, choosing whether a corrupt image is replaced.
    pub fn write_config_with(&self, online: bool, recover_corrupt_log: bool) {
        let config = json!({
            "store_path": self.store_path(),
            "storage_size": CAPACITY,
            "max_slots": MAX_SLOTS,
            "retry_backoff_ms": 0,
            "tick_interval_ms": 0,
            "log_level": "warn",
            "recover_corrupt_log": recover_corrupt_log,
            "simulation": {
                "seed": 7,
                "offline_probability": if online { 0.0 } else { 1.0 },
                "publish_failure_probability": 0.0,
            }
        });
        fs::write(self.config_path(), config.to_string()).expect("Failed to write config");
    }

    /// Runs a CLI command to completion, optionally with a crash point armed.
    pub fn run(&self, args: &[&str], crash_point: Option<&str>) -> CrashTestResult {
        let config = self.config_path();
        let mut command = Command::new(env!("CARGO_BIN_EXE_stationlog"));
        command.args(args).arg("--config").arg(&config);
        if let Some(point) = crash_point {
            command.env(CRASH_POINT_ENV, point);
        }

        let output = command.output().expect("Failed to spawn stationlog");
        CrashTestResult {
            crashed: output.status.code().is_none(),
            exit_status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Flips one byte of the image so its checksum no longer matches.
    pub fn corrupt_image(&self) {
        let mut bytes = fs::read(self.store_path()).expect("Failed to read image");
        bytes[20] ^= 0xFF;
        fs::write(self.store_path(), bytes).expect("Failed to write image");
    }

    /// Reopens the storage image and returns the pending payloads.
    pub fn pending_payloads(&self) -> Vec<String> {
        let store = FileStore::open(&self.store_path(), CAPACITY).expect("image must open");
        let log = RecordLog::load(store, MAX_SLOTS).expect("header must be valid");
        log.pending_records()
            .expect("records must be readable")
            .into_iter()
            .map(|(_, payload)| String::from_utf8_lossy(&payload).into_owned())
            .collect()
    }
}

/// Report crash test failure
pub fn report_failure(crash_point: &str, expected: &str, result: &CrashTestResult) {
    eprintln!("=== CRASH TEST FAILURE ===");
    eprintln!("Crash point: {}", crash_point);
    eprintln!("Expected: {}", expected);
    eprintln!("Exit status: {:?}", result.exit_status);
    eprintln!("stdout:\n{}", result.stdout);
    eprintln!("stderr:\n{}", result.stderr);
    eprintln!("==========================");
}
