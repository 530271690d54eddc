//! Crash point injection for power-loss testing
//!
//! Setting `STATIONLOG_CRASH_POINT=<name>` makes the process abort the
//! moment execution reaches the named point. No cleanup, no unwinding: the
//! closest a host process gets to pulling the battery.
//!
//! ```bash
//! STATIONLOG_CRASH_POINT=log_append_before_commit stationlog run --ticks 3
//! ```

use std::sync::OnceLock;

/// Environment variable that selects the crash point.
pub const CRASH_POINT_ENV: &str = "STATIONLOG_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `STATIONLOG_CRASH_POINT` equals `name`.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Aborts the process if the named crash point is enabled.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    // Store commit protocol
    pub const STORE_BEFORE_COMMIT: &str = "store_before_commit";
    pub const STORE_AFTER_TEMP_WRITE: &str = "store_after_temp_write";
    pub const STORE_AFTER_COMMIT: &str = "store_after_commit";

    // Record log mutations
    pub const LOG_APPEND_BEFORE_COMMIT: &str = "log_append_before_commit";
    pub const LOG_RETIRE_BEFORE_COMMIT: &str = "log_retire_before_commit";

    // Flush protocol
    pub const FLUSH_AFTER_PUBLISH: &str = "flush_after_publish";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[
            STORE_BEFORE_COMMIT,
            STORE_AFTER_TEMP_WRITE,
            STORE_AFTER_COMMIT,
            LOG_APPEND_BEFORE_COMMIT,
            LOG_RETIRE_BEFORE_COMMIT,
            FLUSH_AFTER_PUBLISH,
        ]
    }
}
