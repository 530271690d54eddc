//! ByteStore error types
//!
//! Error codes:
//! - STATION_STORE_ADDRESS_OUT_OF_RANGE (ERROR severity)
//! - STATION_STORE_COMMIT_FAILED (FATAL severity)
//! - STATION_STORE_OPEN_FAILED (FATAL severity)
//! - STATION_STORE_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity of a storage error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation is rejected, the node keeps running
    Error,
    /// The medium can no longer be trusted; the node must restart
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// ByteStore error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Read or write outside `[0, capacity)`
    AddressOutOfRange,
    /// Pending writes could not be made durable
    CommitFailed,
    /// The backing medium could not be opened
    OpenFailed,
    /// The persisted image failed validation
    Corruption,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::AddressOutOfRange => "STATION_STORE_ADDRESS_OUT_OF_RANGE",
            StoreErrorCode::CommitFailed => "STATION_STORE_COMMIT_FAILED",
            StoreErrorCode::OpenFailed => "STATION_STORE_OPEN_FAILED",
            StoreErrorCode::Corruption => "STATION_STORE_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::AddressOutOfRange => Severity::Error,
            StoreErrorCode::CommitFailed => Severity::Fatal,
            StoreErrorCode::OpenFailed => Severity::Fatal,
            StoreErrorCode::Corruption => Severity::Fatal,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// ByteStore error with context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    /// Address outside the store
    pub fn out_of_range(address: usize, capacity: usize) -> Self {
        Self {
            code: StoreErrorCode::AddressOutOfRange,
            message: format!("address {} is outside the store", address),
            details: Some(format!("capacity: {}", capacity)),
            source: None,
        }
    }

    /// Durable write failed
    pub fn commit_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StoreErrorCode::CommitFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Backing medium could not be opened
    pub fn open_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StoreErrorCode::OpenFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Persisted image is damaged
    pub fn corruption(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::Corruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether the node must restart
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for ByteStore operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_is_not_fatal() {
        let err = StoreError::out_of_range(600, 512);
        assert!(!err.is_fatal());
        assert_eq!(err.code(), StoreErrorCode::AddressOutOfRange);
    }

    #[test]
    fn test_commit_failure_is_fatal() {
        let err = StoreError::commit_failed(
            "rename failed",
            io::Error::new(io::ErrorKind::Other, "read-only filesystem"),
        );
        assert!(err.is_fatal());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display_contains_code_and_details() {
        let display = format!("{}", StoreError::out_of_range(600, 512));
        assert!(display.contains("STATION_STORE_ADDRESS_OUT_OF_RANGE"));
        assert!(display.contains("ERROR"));
        assert!(display.contains("capacity: 512"));
    }
}
