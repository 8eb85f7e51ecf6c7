//! Record log errors
//!
//! | Code                         | Severity | Raised when                          |
//! |------------------------------|----------|--------------------------------------|
//! | OFFLINE_LOG_APPEND_FAILED    | ERROR    | a frame could not be made durable    |
//! | OFFLINE_LOG_REWRITE_FAILED   | ERROR    | compaction or tail truncation failed |
//! | OFFLINE_LOG_READ_FAILED      | ERROR    | the log file could not be read       |
//! | OFFLINE_DATA_CORRUPTION      | FATAL    | a frame fails validation on replay   |
//!
//! A failed append or rewrite leaves the log replaying as before, so the
//! store keeps serving. Corruption means the log cannot be trusted and the
//! store refuses to open.

use std::fmt;
use std::io;

use crate::observability::Severity;

/// Which log operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    AppendFailed,
    RewriteFailed,
    ReadFailed,
    DataCorruption,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::AppendFailed => "OFFLINE_LOG_APPEND_FAILED",
            StorageErrorCode::RewriteFailed => "OFFLINE_LOG_REWRITE_FAILED",
            StorageErrorCode::ReadFailed => "OFFLINE_LOG_READ_FAILED",
            StorageErrorCode::DataCorruption => "OFFLINE_DATA_CORRUPTION",
        }
    }

    pub fn severity(&self) -> Severity {
        if *self == StorageErrorCode::DataCorruption {
            Severity::Fatal
        } else {
            Severity::Error
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error raised by a `RecordLog`
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    /// Position in the log file the error refers to
    offset: Option<u64>,
    source: Option<io::Error>,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            offset: None,
            source: None,
        }
    }

    /// Attaches the underlying I/O failure.
    pub fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Attaches the byte offset in the log file.
    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn append_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::AppendFailed, message).with_source(source)
    }

    pub fn rewrite_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::RewriteFailed, message).with_source(source)
    }

    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::ReadFailed, message).with_source(source)
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::DataCorruption, message)
    }

    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self::corruption(reason).at_offset(offset)
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn is_fatal(&self) -> bool {
        self.code.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (byte_offset: {})", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
