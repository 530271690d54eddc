//! Crash testing for stationlog
//!
//! - Runs the real binary as a subprocess
//! - Injects an abort via `STATIONLOG_CRASH_POINT`
//! - Reopens the storage image and checks what survived

pub mod harness;
mod scenarios;
