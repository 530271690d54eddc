//! Connectivity-gated flush of the record log
//!
//! Records leave the log only after the publisher accepted them; under the
//! default policy a failed publish keeps that record and every later one
//! pending, so ordering is preserved across ticks.

mod coordinator;

pub use coordinator::{DrainOutcome, DrainPolicy, FlushCoordinator};
