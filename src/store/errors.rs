//! # Store Errors

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by `OfflineStore`
///
/// Retrieving an unknown record type is not an error; it yields an empty
/// sequence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Empty record type
    #[error("Record type must not be empty")]
    InvalidRecordType,

    /// Payload could not be converted to or from its canonical form
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record larger than the whole storage limit, under `OversizePolicy::Reject`
    #[error("Record of {size} bytes exceeds storage limit of {limit} bytes")]
    RecordTooLarge { size: u64, limit: u64 },

    /// Backing log failure; the store is unchanged
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// A writer panicked while holding the state lock
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// A blocking store task panicked or was cancelled before reporting
    #[error("Store task interrupted: {0}")]
    Interrupted(String),

    /// Configuration rejected at construction
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Stable code for API and CLI responses
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidRecordType => "INVALID_RECORD_TYPE",
            StoreError::Serialization(_) => "SERIALIZATION_ERROR",
            StoreError::RecordTooLarge { .. } => "RECORD_TOO_LARGE",
            StoreError::Storage(e) => e.code().code(),
            StoreError::LockPoisoned => "LOCK_POISONED",
            StoreError::Interrupted(_) => "STORE_TASK_INTERRUPTED",
            StoreError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::InvalidRecordType => 400,
            StoreError::Serialization(_) => 400,
            StoreError::RecordTooLarge { .. } => 413,
            StoreError::InvalidConfig(_) => 400,
            StoreError::Storage(_) | StoreError::LockPoisoned | StoreError::Interrupted(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StoreError::InvalidRecordType.status_code(), 400);
        assert_eq!(
            StoreError::RecordTooLarge { size: 200, limit: 100 }.status_code(),
            413
        );
        assert_eq!(StoreError::LockPoisoned.status_code(), 500);
    }

    #[test]
    fn test_storage_error_keeps_its_code() {
        let err = StoreError::from(StorageError::corruption("bad frame"));
        assert_eq!(err.code(), "OFFLINE_DATA_CORRUPTION");
        assert!(err.to_string().contains("bad frame"));
    }

    #[test]
    fn test_too_large_message() {
        let err = StoreError::RecordTooLarge { size: 200, limit: 100 };
        assert_eq!(
            err.to_string(),
            "Record of 200 bytes exceeds storage limit of 100 bytes"
        );
    }
}
