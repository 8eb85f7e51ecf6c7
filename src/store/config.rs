//! Store configuration
//!
//! Everything the store needs is passed in at construction. Nothing is read
//! from globals or the environment.

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// 1000 GiB, the buffer size the offline manager has always shipped with.
pub const DEFAULT_STORAGE_LIMIT: u64 = 1000 * 1024 * 1024 * 1024;

/// Field name redacted when no other fields are configured.
pub const DEFAULT_SENSITIVE_FIELD: &str = "dna_secrets";

/// Replacement written over redacted values.
pub const DEFAULT_REDACTION_MARKER: &str = "REDACTED";

/// What `store` does with a record larger than the whole storage limit.
///
/// Such a record can never fit, so neither policy evicts anything for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Fail the call with `StoreError::RecordTooLarge`
    #[default]
    Reject,
    /// Log `STORAGE_EXHAUSTED` and return `StoreOutcome::Dropped`
    Drop,
}

/// Configuration for an `OfflineStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Total byte budget across all retained records
    #[serde(default = "default_storage_limit")]
    pub storage_limit_bytes: u64,

    /// Object keys whose values are replaced before persisting
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,

    /// Value written in place of a sensitive field
    #[serde(default = "default_redaction_marker")]
    pub redaction_marker: String,

    /// Handling of records that exceed `storage_limit_bytes` on their own
    #[serde(default)]
    pub oversize_policy: OversizePolicy,
}

fn default_storage_limit() -> u64 {
    DEFAULT_STORAGE_LIMIT
}

fn default_sensitive_fields() -> Vec<String> {
    vec![DEFAULT_SENSITIVE_FIELD.to_string()]
}

fn default_redaction_marker() -> String {
    DEFAULT_REDACTION_MARKER.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_limit_bytes: default_storage_limit(),
            sensitive_fields: default_sensitive_fields(),
            redaction_marker: default_redaction_marker(),
            oversize_policy: OversizePolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Default configuration with a different byte budget
    pub fn with_limit(storage_limit_bytes: u64) -> Self {
        Self {
            storage_limit_bytes,
            ..Default::default()
        }
    }

    /// Replace the oversize policy
    pub fn oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize_policy = policy;
        self
    }

    /// Replace the set of sensitive fields
    pub fn sensitive_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the redaction marker
    pub fn redaction_marker(mut self, marker: impl Into<String>) -> Self {
        self.redaction_marker = marker.into();
        self
    }

    /// Reject configurations the store cannot honour
    pub fn validate(&self) -> StoreResult<()> {
        if self.storage_limit_bytes == 0 {
            return Err(StoreError::InvalidConfig(
                "storage_limit_bytes must be > 0".to_string(),
            ));
        }

        if self.sensitive_fields.iter().any(|f| f.is_empty()) {
            return Err(StoreError::InvalidConfig(
                "sensitive_fields must not contain empty names".to_string(),
            ));
        }

        Ok(())
    }
}
