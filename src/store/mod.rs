//! Bounded append-only record store
//!
//! The offline buffer every producer writes through. It accepts typed JSON
//! payloads, redacts sensitive fields, keeps the total retained size under a
//! byte budget by evicting oldest-first, and answers retrieval by type.
//!
//! # Invariants
//!
//! - `current_storage` equals the sum of retained record sizes
//! - `current_storage <= storage_limit` after every successful `store`
//! - A record's size is the canonical byte length of its redacted payload
//! - Sensitive fields are never observable through `retrieve`
//! - `retrieve` returns payloads in commit order
//! - A failed `store` changes nothing

mod config;
mod engine;
mod errors;
mod record;
mod redact;

pub use config::{
    OversizePolicy, StoreConfig, DEFAULT_REDACTION_MARKER, DEFAULT_SENSITIVE_FIELD,
    DEFAULT_STORAGE_LIMIT,
};
pub use engine::OfflineStore;
pub use errors::{StoreError, StoreResult};
pub use record::{RecordRow, StoreOutcome, StoreReceipt, StoreStats, StoredRecord};
pub use redact::Redactor;
