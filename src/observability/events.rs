//! Observable node events
//!
//! Events are explicit and typed; the string form is what lands in the
//! `event` field of a log line.

use std::fmt;

/// Observable events of the sensor node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Boot sequence begins
    NodeBootBegin,
    /// Boot complete, entering the tick loop
    NodeBootComplete,
    /// Configuration file parsed and validated
    ConfigLoaded,
    /// Tick loop exited
    NodeStopped,
    /// Unrecoverable fault, process must restart
    NodeFault,

    // Record log
    /// Header read from storage
    LogLoaded,
    /// Store zeroed
    LogErased,
    /// Header failed validation
    LogCorruption,
    /// Unreadable storage image replaced by a zeroed one
    StoreImageDiscarded,
    /// Record written to local storage
    RecordAppended,
    /// Record could not be stored and is discarded
    RecordDropped,
    /// Pending record listed at tick start
    RecordPending,

    // Tick
    /// Tick begins
    TickBegin,
    /// Reading taken
    ReadingSampled,
    /// Sensor read failed, tick skipped
    SensorFailed,
    /// Link down, taking the offline path
    ConnectivityUnavailable,

    // Broker / publish
    /// Broker session established
    BrokerConnected,
    /// Broker connect attempt failed
    BrokerConnectFailed,
    /// Payload accepted by the broker
    PublishOk,
    /// One publish attempt failed, more may follow
    PublishAttemptFailed,
    /// Publish failed after the whole retry budget
    PublishFailed,

    // Flush
    /// Drain found no pending records
    FlushNothingPending,
    /// Drain stopped early, records retained
    FlushPartial,
    /// Drain discarded records whose publish failed
    FlushRecordsLost,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::NodeBootBegin => "NODE_BOOT_BEGIN",
            Event::NodeBootComplete => "NODE_BOOT_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::NodeStopped => "NODE_STOPPED",
            Event::NodeFault => "NODE_FAULT",

            Event::LogLoaded => "LOG_LOADED",
            Event::LogErased => "LOG_ERASED",
            Event::LogCorruption => "LOG_CORRUPTION",
            Event::StoreImageDiscarded => "STORE_IMAGE_DISCARDED",
            Event::RecordAppended => "RECORD_APPENDED",
            Event::RecordDropped => "RECORD_DROPPED",
            Event::RecordPending => "RECORD_PENDING",

            Event::TickBegin => "TICK_BEGIN",
            Event::ReadingSampled => "READING_SAMPLED",
            Event::SensorFailed => "SENSOR_READ_FAILED",
            Event::ConnectivityUnavailable => "CONNECTIVITY_UNAVAILABLE",

            Event::BrokerConnected => "BROKER_CONNECTED",
            Event::BrokerConnectFailed => "BROKER_CONNECT_FAILED",
            Event::PublishOk => "PUBLISH_OK",
            Event::PublishAttemptFailed => "PUBLISH_ATTEMPT_FAILED",
            Event::PublishFailed => "PUBLISH_FAILED",

            Event::FlushNothingPending => "FLUSH_NOTHING_PENDING",
            Event::FlushPartial => "FLUSH_PARTIAL",
            Event::FlushRecordsLost => "FLUSH_RECORDS_LOST",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::NodeFault)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
