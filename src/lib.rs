//! stationlog - store-and-forward sensor node
//!
//! Durable record log over a byte-addressable store, drained through a
//! connectivity gate whenever the link is up.

pub mod cli;
pub mod config;
pub mod connectivity;
pub mod crash_point;
pub mod flush;
pub mod node;
pub mod observability;
pub mod record_log;
pub mod store;
pub mod telemetry;
