//! # Task Errors

use thiserror::Error;

use crate::store::StoreError;

/// Result type for task submitter operations
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors from the task submitter
#[derive(Debug, Error)]
pub enum TaskError {
    /// Request is missing something the task needs
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Validator broke its contract of returning a finite score in [0, 1]
    #[error("Validator returned out-of-range score: {0}")]
    InvalidScore(f64),

    /// The store refused or failed the write
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl TaskError {
    /// HTTP status for this error
    pub fn status_code(&self) -> u16 {
        match self {
            TaskError::InvalidTask(_) => 400,
            TaskError::InvalidScore(_) => 502,
            TaskError::Store(e) => e.status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_status_passes_through() {
        let err = TaskError::from(StoreError::RecordTooLarge { size: 2, limit: 1 });
        assert_eq!(err.status_code(), 413);
        assert_eq!(TaskError::InvalidScore(1.5).status_code(), 502);
    }
}
