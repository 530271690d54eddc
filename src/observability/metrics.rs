//! Node counters
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Relaxed atomics; exactness per counter, not across counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of the tick loop
#[derive(Debug, Default)]
pub struct NodeMetrics {
    ticks: AtomicU64,
    readings_sampled: AtomicU64,
    sensor_failures: AtomicU64,
    offline_ticks: AtomicU64,
    records_buffered: AtomicU64,
    records_dropped: AtomicU64,
    records_flushed: AtomicU64,
    records_lost: AtomicU64,
    live_published: AtomicU64,
    publish_failures: AtomicU64,
}

impl NodeMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_readings(&self) {
        self.readings_sampled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sensor_failures(&self) {
        self.sensor_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_offline_ticks(&self) {
        self.offline_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_buffered(&self) {
        self.records_buffered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Add records drained from local storage
    pub fn add_flushed(&self, count: u64) {
        self.records_flushed.fetch_add(count, Ordering::Relaxed);
    }

    /// Add records discarded by a clear-all drain
    pub fn add_lost(&self, count: u64) {
        self.records_lost.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_live_published(&self) {
        self.live_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_publish_failures(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            readings_sampled: self.readings_sampled.load(Ordering::Relaxed),
            sensor_failures: self.sensor_failures.load(Ordering::Relaxed),
            offline_ticks: self.offline_ticks.load(Ordering::Relaxed),
            records_buffered: self.records_buffered.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            records_lost: self.records_lost.load(Ordering::Relaxed),
            live_published: self.live_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub readings_sampled: u64,
    pub sensor_failures: u64,
    pub offline_ticks: u64,
    pub records_buffered: u64,
    pub records_dropped: u64,
    pub records_flushed: u64,
    pub records_lost: u64,
    pub live_published: u64,
    pub publish_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(NodeMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = NodeMetrics::new();
        metrics.increment_ticks();
        metrics.increment_ticks();
        metrics.increment_buffered();
        metrics.add_flushed(3);
        metrics.add_flushed(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.records_buffered, 1);
        assert_eq!(snapshot.records_flushed, 5);
        assert_eq!(snapshot.records_lost, 0);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let metrics = NodeMetrics::new();
        metrics.increment_publish_failures();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["publish_failures"], 1);
        assert_eq!(json["ticks"], 0);
    }
}
