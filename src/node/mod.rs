//! Sensor node: boot sequence and tick loop
//!
//! The node owns the record log and drives a `TelemetrySource` and a
//! `ConnectivityGate` once per tick. Only fatal record log errors leave the
//! loop; the process then exits and an external watchdog restarts it.

mod errors;
mod main_loop;

pub use errors::{NodeError, NodeResult};
pub use main_loop::{Disposition, Node, TickOutcome};
