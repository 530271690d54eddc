//! Crash scenarios
//!
//! - Crash before commit: the mutation is lost, the previous image is intact
//! - Crash after commit: the mutation survives
//! - Crash mid-drain: published records stay pending (at-least-once)

use stationlog::crash_point::points;

use super::harness::{report_failure, CrashTestResult, NodeDir};

fn assert_crashed(point: &str, result: &CrashTestResult) {
    if !result.crashed {
        report_failure(point, "process abort", result);
    }
    assert!(result.crashed, "crash point {} did not fire", point);
}

fn initialized(online: bool) -> NodeDir {
    let node = NodeDir::new();
    node.write_config(online);
    let result = node.run(&["init"], None);
    assert!(result.exit_status.success(), "init failed: {}", result.stdout);
    node
}

/// Two records buffered by a clean offline run, config switched to online.
fn with_two_pending() -> NodeDir {
    let node = initialized(false);
    let result = node.run(&["run", "--ticks", "2"], None);
    assert!(result.exit_status.success(), "run failed: {}", result.stdout);
    assert_eq!(node.pending_payloads().len(), 2);
    node.write_config(true);
    node
}

// =============================================================================
// Append
// =============================================================================

#[test]
fn test_clean_offline_run_buffers_every_tick() {
    let node = initialized(false);
    let result = node.run(&["run", "--ticks", "3"], None);

    assert!(result.exit_status.success());
    assert!(result.stdout.contains("\"status\":\"ok\""));
    assert_eq!(node.pending_payloads().len(), 3);
}

#[test]
fn test_crash_before_append_commit_loses_only_that_record() {
    for point in [
        points::LOG_APPEND_BEFORE_COMMIT,
        points::STORE_BEFORE_COMMIT,
        points::STORE_AFTER_TEMP_WRITE,
    ] {
        let node = initialized(false);
        let result = node.run(&["run", "--ticks", "3"], Some(point));

        assert_crashed(point, &result);
        assert!(
            node.pending_payloads().is_empty(),
            "{}: uncommitted record visible after crash",
            point
        );
    }
}

#[test]
fn test_crash_after_commit_keeps_record() {
    let node = initialized(false);
    let result = node.run(&["run", "--ticks", "3"], Some(points::STORE_AFTER_COMMIT));

    assert_crashed(points::STORE_AFTER_COMMIT, &result);
    let pending = node.pending_payloads();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].starts_with("{t:"));
}

#[test]
fn test_stale_temp_file_does_not_block_reopen() {
    let node = initialized(false);
    node.run(&["run", "--ticks", "1"], Some(points::STORE_AFTER_TEMP_WRITE));

    assert!(node.path().join("node.eeprom.tmp").exists());
    let result = node.run(&["run", "--ticks", "2"], None);
    assert!(result.exit_status.success(), "{}", result.stdout);
    assert_eq!(node.pending_payloads().len(), 2);
}

// =============================================================================
// Drain
// =============================================================================

#[test]
fn test_crash_mid_drain_keeps_records_pending() {
    for point in [points::FLUSH_AFTER_PUBLISH, points::LOG_RETIRE_BEFORE_COMMIT] {
        let node = with_two_pending();
        let before = node.pending_payloads();

        let result = node.run(&["run", "--ticks", "1"], Some(point));

        assert_crashed(point, &result);
        assert_eq!(node.pending_payloads(), before, "{}", point);
    }
}

#[test]
fn test_clean_online_run_drains_log() {
    let node = with_two_pending();
    let result = node.run(&["run", "--ticks", "1"], None);

    assert!(result.exit_status.success(), "{}", result.stdout);
    assert!(node.pending_payloads().is_empty());
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn test_init_refuses_existing_image() {
    let node = initialized(false);
    let result = node.run(&["init"], None);

    assert_eq!(result.exit_status.code(), Some(1));
    assert!(result.stdout.contains("STATION_CLI_ALREADY_INITIALIZED"));
}

#[test]
fn test_run_without_init_fails() {
    let node = NodeDir::new();
    node.write_config(false);
    let result = node.run(&["run", "--ticks", "1"], None);

    assert_eq!(result.exit_status.code(), Some(1));
    assert!(result.stdout.contains("STATION_CLI_NOT_INITIALIZED"));
}

#[test]
fn test_dump_and_erase() {
    let node = with_two_pending();

    let dump = node.run(&["dump"], None);
    assert!(dump.exit_status.success());
    assert!(dump.stdout.contains("\"records\""));
    assert_eq!(node.pending_payloads().len(), 2);

    let erase = node.run(&["erase"], None);
    assert!(erase.exit_status.success());
    assert!(node.pending_payloads().is_empty());
}

// =============================================================================
// Corrupt Image
// =============================================================================

#[test]
fn test_erase_replaces_corrupt_image() {
    let node = with_two_pending();
    node.corrupt_image();

    let dump = node.run(&["dump"], None);
    assert_eq!(dump.exit_status.code(), Some(1));
    assert!(dump.stdout.contains("STATION_CLI_STORE_ERROR"));

    let erase = node.run(&["erase"], None);
    assert!(erase.exit_status.success(), "{}", erase.stdout);
    assert!(node.pending_payloads().is_empty());
}

#[test]
fn test_run_recovers_corrupt_image() {
    let node = initialized(false);
    node.run(&["run", "--ticks", "2"], None);
    node.corrupt_image();

    let result = node.run(&["run", "--ticks", "1"], None);

    assert!(result.exit_status.success(), "{}", result.stdout);
    assert!(result.stdout.contains("STORE_IMAGE_DISCARDED"));
    assert_eq!(node.pending_payloads().len(), 1);
}

#[test]
fn test_run_refuses_corrupt_image_without_recovery() {
    let node = NodeDir::new();
    node.write_config_with(false, false);
    assert!(node.run(&["init"], None).exit_status.success());
    node.run(&["run", "--ticks", "2"], None);
    node.corrupt_image();

    let result = node.run(&["run", "--ticks", "1"], None);

    assert_eq!(result.exit_status.code(), Some(1));
    assert!(result.stdout.contains("STATION_CLI_STORE_ERROR"));
}
