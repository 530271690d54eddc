//! Node errors

use thiserror::Error;

use crate::record_log::LogError;

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

/// A failure the tick loop cannot absorb. The process is expected to exit
/// and be restarted.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The record log could not be opened at boot
    #[error("Boot failed: {0}")]
    Boot(#[source] LogError),

    /// The record log failed mid-tick
    #[error("Record log fault: {0}")]
    Log(#[from] LogError),
}

impl NodeError {
    /// The underlying log error
    pub fn log_error(&self) -> &LogError {
        match self {
            NodeError::Boot(e) | NodeError::Log(e) => e,
        }
    }

    pub fn code(&self) -> &'static str {
        self.log_error().code().code()
    }
}
