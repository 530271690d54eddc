//! Observability for the sensor node
//!
//! - Structured JSON logging with a process-wide minimum severity
//! - Typed lifecycle and data-path events
//! - Monotonic counters
//! - Begin/complete scopes
//!
//! Observability is read-only: nothing here influences what is stored or
//! published, and a failed log write is ignored.
//!
//! ```ignore
//! use stationlog::observability::{Event, Logger, NodeMetrics, ObservationScope};
//!
//! Logger::info(Event::RecordAppended.as_str(), &[("offset", "13")]);
//!
//! let scope = ObservationScope::new("FLUSH");
//! // ... drain ...
//! scope.complete(&[("published", "3")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, NodeMetrics};
pub use scope::ObservationScope;

/// Log a lifecycle event at INFO, or FATAL for fatal events
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
