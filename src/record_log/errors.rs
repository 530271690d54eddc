//! RecordLog error types
//!
//! Error codes:
//! - STATION_LOG_STORAGE_FULL (ERROR severity)
//! - STATION_LOG_RECORD_TOO_LONG (ERROR severity)
//! - STATION_LOG_ADDRESS_OUT_OF_RANGE (ERROR severity)
//! - STATION_LOG_INVALID_LAYOUT (FATAL severity)
//! - STATION_LOG_CORRUPTION (FATAL severity)
//! - STATION_LOG_STORE_FAILED (FATAL severity)
//!
//! ERROR-severity failures are rejections: the log is left exactly as it was.

use std::fmt;

use crate::store::{Severity, StoreError, StoreErrorCode};

/// RecordLog error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorCode {
    /// Append would exceed the data region or the slot table
    StorageFull,
    /// Payload longer than a length byte can describe
    RecordTooLong,
    /// Offset outside the written data region
    AddressOutOfRange,
    /// Capacity and slot count cannot form a usable layout
    InvalidLayout,
    /// Header or record bytes failed validation
    Corruption,
    /// Underlying store could not persist a mutation
    StoreFailed,
}

impl LogErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            LogErrorCode::StorageFull => "STATION_LOG_STORAGE_FULL",
            LogErrorCode::RecordTooLong => "STATION_LOG_RECORD_TOO_LONG",
            LogErrorCode::AddressOutOfRange => "STATION_LOG_ADDRESS_OUT_OF_RANGE",
            LogErrorCode::InvalidLayout => "STATION_LOG_INVALID_LAYOUT",
            LogErrorCode::Corruption => "STATION_LOG_CORRUPTION",
            LogErrorCode::StoreFailed => "STATION_LOG_STORE_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            LogErrorCode::StorageFull
            | LogErrorCode::RecordTooLong
            | LogErrorCode::AddressOutOfRange => Severity::Error,
            LogErrorCode::InvalidLayout
            | LogErrorCode::Corruption
            | LogErrorCode::StoreFailed => Severity::Fatal,
        }
    }
}

impl fmt::Display for LogErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// RecordLog error with context
#[derive(Debug)]
pub struct LogError {
    code: LogErrorCode,
    message: String,
    details: Option<String>,
    source: Option<StoreError>,
}

impl LogError {
    fn new(code: LogErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Not enough room in the data region
    pub fn storage_full_bytes(needed: usize, available: usize) -> Self {
        Self::new(LogErrorCode::StorageFull, "data region exhausted")
            .with_details(format!("needed: {}, available: {}", needed, available))
    }

    /// Every slot is in use
    pub fn storage_full_slots(max_slots: usize) -> Self {
        Self::new(LogErrorCode::StorageFull, "slot table exhausted")
            .with_details(format!("max_slots: {}", max_slots))
    }

    /// Payload longer than 255 bytes
    pub fn record_too_long(len: usize) -> Self {
        Self::new(
            LogErrorCode::RecordTooLong,
            format!("payload of {} bytes exceeds the 255 byte record limit", len),
        )
    }

    /// Offset outside the written data region
    pub fn out_of_range(offset: usize, start: usize, end: usize) -> Self {
        Self::new(
            LogErrorCode::AddressOutOfRange,
            format!("offset {} is outside the data region", offset),
        )
        .with_details(format!("data region: [{}, {})", start, end))
    }

    /// Unusable capacity/slot combination
    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::new(LogErrorCode::InvalidLayout, message)
    }

    /// Header or record failed validation at a byte offset
    pub fn corruption_at_offset(offset: usize, reason: impl Into<String>) -> Self {
        Self::new(LogErrorCode::Corruption, reason)
            .with_details(format!("byte_offset: {}", offset))
    }

    /// Returns the error code
    pub fn code(&self) -> LogErrorCode {
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

    /// Returns true for `StorageFull`
    pub fn is_storage_full(&self) -> bool {
        self.code == LogErrorCode::StorageFull
    }

    /// Returns true for `Corruption`
    pub fn is_corruption(&self) -> bool {
        self.code == LogErrorCode::Corruption
    }
}

impl From<StoreError> for LogError {
    fn from(err: StoreError) -> Self {
        let code = match err.code() {
            StoreErrorCode::AddressOutOfRange => LogErrorCode::AddressOutOfRange,
            StoreErrorCode::Corruption => LogErrorCode::Corruption,
            StoreErrorCode::CommitFailed | StoreErrorCode::OpenFailed => LogErrorCode::StoreFailed,
        };
        Self {
            code,
            message: err.message().to_string(),
            details: err.details().map(str::to_string),
            source: Some(err),
        }
    }
}

impl fmt::Display for LogError {
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

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for RecordLog operations
pub type LogResult<T> = Result<T, LogError>;
