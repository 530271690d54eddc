//! FlushCoordinator: drains pending records through a publish capability
//!
//! The coordinator calls `publish` once per record and never retries; the
//! retry budget belongs to the connectivity layer. What happens to records
//! whose publish failed is decided by the `DrainPolicy`.

use serde::{Deserialize, Serialize};

use crate::crash_point::{maybe_crash, points};
use crate::observability::{Event, Logger, ObservationScope};
use crate::record_log::{LogResult, RecordLog};
use crate::store::ByteStore;

/// What to do with records whose publish failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Stop at the first failure; the failed record and everything after it
    /// stay pending for the next tick.
    #[default]
    RetainFailed,
    /// Offer every record once, then clear the log whatever the results.
    ClearAll,
}

/// Result of one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The log was empty
    NothingToFlush,
    /// Every pending record was published and the log is empty
    Drained { published: usize },
    /// A publish failed; `remaining` records are still pending
    Partial { published: usize, remaining: usize },
    /// `ClearAll` discarded `lost` records whose publish failed
    Lost { published: usize, lost: usize },
}

impl DrainOutcome {
    /// Records successfully handed to the publisher.
    pub fn published(&self) -> usize {
        match *self {
            DrainOutcome::NothingToFlush => 0,
            DrainOutcome::Drained { published }
            | DrainOutcome::Partial { published, .. }
            | DrainOutcome::Lost { published, .. } => published,
        }
    }

    /// Returns true if the log is empty after the drain.
    pub fn is_complete(&self) -> bool {
        !matches!(self, DrainOutcome::Partial { .. })
    }
}

/// Drains a RecordLog under a fixed policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushCoordinator {
    policy: DrainPolicy,
}

impl FlushCoordinator {
    pub fn new(policy: DrainPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DrainPolicy {
        self.policy
    }

    /// Publishes every pending record in append order.
    ///
    /// # Errors
    ///
    /// Storage errors from reading records or rewriting the header. A
    /// failing `publish` is not an error; it shows up in the outcome.
    pub fn drain_and_publish<S, F>(
        &self,
        log: &mut RecordLog<S>,
        mut publish: F,
    ) -> LogResult<DrainOutcome>
    where
        S: ByteStore,
        F: FnMut(&[u8]) -> bool,
    {
        if log.is_empty() {
            Logger::info(Event::FlushNothingPending.as_str(), &[]);
            return Ok(DrainOutcome::NothingToFlush);
        }

        let pending = log.len().to_string();
        let scope = ObservationScope::with_fields("FLUSH", &[("pending", pending.as_str())]);

        let result = match self.policy {
            DrainPolicy::RetainFailed => Self::drain_retaining(log, &mut publish),
            DrainPolicy::ClearAll => Self::drain_clearing(log, &mut publish),
        };

        match result {
            Ok(outcome) => {
                let published = outcome.published().to_string();
                scope.complete(&[("published", published.as_str())]);
                Ok(outcome)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn drain_retaining<S, F>(log: &mut RecordLog<S>, publish: &mut F) -> LogResult<DrainOutcome>
    where
        S: ByteStore,
        F: FnMut(&[u8]) -> bool,
    {
        let offsets = log.pending_offsets().to_vec();
        let mut published = 0;

        for &offset in &offsets {
            let payload = log.read_at(offset)?;
            if !publish(payload.as_slice()) {
                break;
            }
            maybe_crash(points::FLUSH_AFTER_PUBLISH);
            published += 1;
        }

        log.retire(published)?;

        if published == offsets.len() {
            return Ok(DrainOutcome::Drained { published });
        }

        let remaining = log.len();
        let (p, r) = (published.to_string(), remaining.to_string());
        Logger::warn(
            Event::FlushPartial.as_str(),
            &[("published", p.as_str()), ("remaining", r.as_str())],
        );
        Ok(DrainOutcome::Partial {
            published,
            remaining,
        })
    }

    fn drain_clearing<S, F>(log: &mut RecordLog<S>, publish: &mut F) -> LogResult<DrainOutcome>
    where
        S: ByteStore,
        F: FnMut(&[u8]) -> bool,
    {
        let records = log.pending_records()?;
        let mut published = 0;

        for (_, payload) in &records {
            if publish(payload.as_slice()) {
                published += 1;
            }
            maybe_crash(points::FLUSH_AFTER_PUBLISH);
        }

        log.clear()?;

        let lost = records.len() - published;
        if lost == 0 {
            return Ok(DrainOutcome::Drained { published });
        }

        let l = lost.to_string();
        Logger::error(Event::FlushRecordsLost.as_str(), &[("lost", l.as_str())]);
        Ok(DrainOutcome::Lost { published, lost })
    }
}
