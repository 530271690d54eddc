//! # Connectivity Errors

use thiserror::Error;

/// Result type for transport calls
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for gate operations
pub type ConnectivityResult<T> = Result<T, ConnectivityError>;

/// Failure reported by a single transport call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Network link is down
    #[error("Link down")]
    LinkDown,

    /// Broker refused or did not answer the connect
    #[error("Broker connect refused: {0}")]
    ConnectRefused(String),

    /// Publish attempted without a broker session
    #[error("Not connected to broker")]
    NotConnected,

    /// Broker did not acknowledge the publish
    #[error("Publish rejected: {0}")]
    PublishRejected(String),
}

/// Failure of a gate operation after its retry budget
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    /// No network link; take the offline path
    #[error("Connectivity unavailable")]
    Unavailable,

    /// Every broker connect attempt failed
    #[error("Broker unreachable after {attempts} attempts: {last}")]
    BrokerUnreachable {
        attempts: u32,
        last: TransportError,
    },

    /// Every publish attempt failed
    #[error("Publish failed after {attempts} attempts: {last}")]
    PublishFailed {
        attempts: u32,
        last: TransportError,
    },
}

impl ConnectivityError {
    /// Log-friendly code
    pub fn code(&self) -> &'static str {
        match self {
            ConnectivityError::Unavailable => "CONNECTIVITY_UNAVAILABLE",
            ConnectivityError::BrokerUnreachable { .. } => "BROKER_UNREACHABLE",
            ConnectivityError::PublishFailed { .. } => "PUBLISH_FAILED",
        }
    }
}
