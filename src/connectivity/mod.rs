//! Network link and broker publishing
//!
//! `ConnectivityGate` is what the node loop sees: a link check and a
//! publish that either delivers within its retry budget or reports failure.
//! `MqttGate` implements it over any `Transport`.

mod errors;
mod gate;
mod transport;

pub use errors::{ConnectivityError, ConnectivityResult, TransportError, TransportResult};
pub use gate::{ConnectivityGate, MqttGate, RetryPolicy};
pub use transport::{LinkProfile, LoggerTransport, Qos, SimulatedTransport, Transport};
