//! The node's tick loop
//!
//! Each tick, strictly in sequence:
//! 1. Sample the sensors; on failure skip the rest of the tick
//! 2. Check the link
//! 3. Offline: append the payload to the record log
//! 4. Online: drain the record log, then publish the current payload
//!
//! A payload is never published ahead of older pending records. If the
//! drain leaves records pending, the current payload is appended behind
//! them instead of being published live.

use std::thread;
use std::time::Duration;

use super::errors::{NodeError, NodeResult};
use crate::connectivity::ConnectivityGate;
use crate::flush::{DrainOutcome, FlushCoordinator};
use crate::observability::{log_event, Event, Logger, MetricsSnapshot, NodeMetrics, Severity};
use crate::record_log::{LogErrorCode, LogOptions, RecordLog};
use crate::store::ByteStore;
use crate::telemetry::TelemetrySource;

/// What happened to the current tick's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Delivered live
    Published,
    /// Stored for a later flush
    Buffered { offset: usize },
    /// Rejected by the record log and discarded
    Dropped { reason: LogErrorCode },
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No reading this tick
    SensorFailed,
    /// Link down; the payload went to the record log
    Offline(Disposition),
    /// Link up; pending records were drained first
    Online {
        drain: DrainOutcome,
        reading: Disposition,
    },
}

/// Sensor node: record log plus its collaborators.
pub struct Node<S: ByteStore, T, G> {
    log: RecordLog<S>,
    source: T,
    gate: G,
    flusher: FlushCoordinator,
    metrics: NodeMetrics,
    tick_interval: Duration,
    ticks: u64,
}

impl<S, T, G> Node<S, T, G>
where
    S: ByteStore,
    T: TelemetrySource,
    G: ConnectivityGate,
{
    /// Opens the record log on `store` and assembles the node.
    ///
    /// # Errors
    ///
    /// `NodeError::Boot` if the log cannot be opened (bad layout, corrupt
    /// header without `reset_on_corruption`, failed erase).
    pub fn boot(
        store: S,
        options: &LogOptions,
        source: T,
        gate: G,
        flusher: FlushCoordinator,
    ) -> NodeResult<Self> {
        let capacity = store.capacity().to_string();
        let slots = options.max_slots.to_string();
        log_event(
            Event::NodeBootBegin,
            &[("capacity", capacity.as_str()), ("max_slots", slots.as_str())],
        );

        let log = match RecordLog::open(store, options) {
            Ok(log) => log,
            Err(e) => {
                log_event(Event::NodeFault, &[("error", e.to_string().as_str())]);
                return Err(NodeError::Boot(e));
            }
        };

        let pending = log.len().to_string();
        log_event(Event::NodeBootComplete, &[("pending", pending.as_str())]);

        Ok(Self {
            log,
            source,
            gate,
            flusher,
            metrics: NodeMetrics::new(),
            tick_interval: Duration::ZERO,
            ticks: 0,
        })
    }

    /// Delay applied before every tick in `run`.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// Only fatal record log errors. Sensor failures, connectivity loss and
    /// rejected appends are reported through the outcome.
    pub fn tick(&mut self) -> NodeResult<TickOutcome> {
        self.ticks += 1;
        self.metrics.increment_ticks();

        let tick = self.ticks.to_string();
        let pending = self.log.len().to_string();
        Logger::trace(
            Event::TickBegin.as_str(),
            &[("pending", pending.as_str()), ("tick", tick.as_str())],
        );
        self.trace_pending();

        let reading = match self.source.sample() {
            Ok(reading) => reading,
            Err(e) => {
                self.metrics.increment_sensor_failures();
                let (channel, reason) = (e.channel().to_string(), e.to_string());
                Logger::warn(
                    Event::SensorFailed.as_str(),
                    &[("channel", channel.as_str()), ("reason", reason.as_str())],
                );
                return Ok(TickOutcome::SensorFailed);
            }
        };
        self.metrics.increment_readings();
        let payload = reading.to_payload();
        let sampled_at = reading.sampled_at.to_rfc3339();
        Logger::trace(
            Event::ReadingSampled.as_str(),
            &[("payload", payload.as_str()), ("sampled_at", sampled_at.as_str())],
        );

        if !self.gate.is_online() {
            self.metrics.increment_offline_ticks();
            Logger::info(Event::ConnectivityUnavailable.as_str(), &[("action", "buffer")]);
            let disposition = self.buffer(payload.as_bytes())?;
            return Ok(TickOutcome::Offline(disposition));
        }

        let gate = &mut self.gate;
        let drain = self
            .flusher
            .drain_and_publish(&mut self.log, |record| gate.publish_one(record))?;
        self.metrics.add_flushed(drain.published() as u64);
        if let DrainOutcome::Lost { lost, .. } = drain {
            self.metrics.add_lost(lost as u64);
        }

        let reading = if !drain.is_complete() {
            self.buffer(payload.as_bytes())?
        } else if self.gate.publish_one(payload.as_bytes()) {
            self.metrics.increment_live_published();
            Disposition::Published
        } else {
            self.metrics.increment_publish_failures();
            self.buffer(payload.as_bytes())?
        };

        Ok(TickOutcome::Online { drain, reading })
    }

    /// Runs ticks until `max_ticks` have completed, or forever when `None`.
    ///
    /// Sleeps the tick interval before every tick. A fatal error is logged
    /// as `NODE_FAULT` and returned.
    pub fn run(&mut self, max_ticks: Option<u64>) -> NodeResult<MetricsSnapshot> {
        let mut completed = 0u64;

        while max_ticks.map_or(true, |max| completed < max) {
            if !self.tick_interval.is_zero() {
                thread::sleep(self.tick_interval);
            }
            if let Err(e) = self.tick() {
                log_event(
                    Event::NodeFault,
                    &[("code", e.code()), ("error", e.to_string().as_str())],
                );
                return Err(e);
            }
            completed += 1;
        }

        let snapshot = self.metrics.snapshot();
        let ticks = completed.to_string();
        log_event(Event::NodeStopped, &[("ticks", ticks.as_str())]);
        Ok(snapshot)
    }

    pub fn log(&self) -> &RecordLog<S> {
        &self.log
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut G {
        &mut self.gate
    }

    pub fn source_mut(&mut self) -> &mut T {
        &mut self.source
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    /// Consumes the node, returning the record log.
    pub fn into_log(self) -> RecordLog<S> {
        self.log
    }

    fn buffer(&mut self, payload: &[u8]) -> NodeResult<Disposition> {
        match self.log.append(payload) {
            Ok(offset) => {
                self.metrics.increment_buffered();
                let (o, pending) = (offset.to_string(), self.log.len().to_string());
                Logger::info(
                    Event::RecordAppended.as_str(),
                    &[("offset", o.as_str()), ("pending", pending.as_str())],
                );
                Ok(Disposition::Buffered { offset })
            }
            Err(e) if !e.is_fatal() => {
                self.metrics.increment_dropped();
                Logger::warn(
                    Event::RecordDropped.as_str(),
                    &[("code", e.code().code()), ("reason", e.message())],
                );
                Ok(Disposition::Dropped { reason: e.code() })
            }
            Err(e) => Err(NodeError::Log(e)),
        }
    }

    fn trace_pending(&self) {
        if !Logger::enabled(Severity::Trace) {
            return;
        }
        for &offset in self.log.pending_offsets() {
            let o = offset.to_string();
            match self.log.read_at(offset) {
                Ok(payload) => {
                    let body = String::from_utf8_lossy(&payload);
                    Logger::trace(
                        Event::RecordPending.as_str(),
                        &[("offset", o.as_str()), ("payload", &*body)],
                    );
                }
                Err(e) => Logger::trace(
                    Event::RecordPending.as_str(),
                    &[("error", e.message()), ("offset", o.as_str())],
                ),
            }
        }
    }
}
