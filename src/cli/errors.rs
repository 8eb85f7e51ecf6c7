//! CLI errors
//!
//! `main` prints these as one JSON line on stderr and exits with status 1.
//! Store failures keep the store's own code in the message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected one JSON value on stdin, got nothing")]
    EmptyInput,

    #[error("Data directory {} is already initialized", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Data directory {} is not initialized; run 'offlinedb init' first", .0.display())]
    NotInitialized(PathBuf),

    #[error("{0}")]
    Boot(String),

    #[error("{} ({})", .0, .0.code())]
    Store(#[from] StoreError),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    pub fn boot(msg: impl Into<String>) -> Self {
        CliError::Boot(msg.into())
    }

    /// Stable code written in the JSON error line
    pub fn code_str(&self) -> &'static str {
        match self {
            CliError::Config(_) => "OFFLINE_CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) | CliError::EmptyInput => "OFFLINE_CLI_IO_ERROR",
            CliError::AlreadyInitialized(_) => "OFFLINE_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "OFFLINE_CLI_NOT_INITIALIZED",
            CliError::Boot(_) => "OFFLINE_CLI_BOOT_FAILED",
            CliError::Store(_) => "OFFLINE_CLI_STORE_FAILED",
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}
