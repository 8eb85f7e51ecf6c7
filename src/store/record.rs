//! Record and result types

use serde::{Deserialize, Serialize};

use crate::storage::LogFrame;

/// A retained record. Immutable once committed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: u64,
    pub record_type: String,
    /// Canonical serialized redacted payload
    pub data: Vec<u8>,
    pub timestamp: f64,
    /// Always `data.len()`
    pub size_bytes: u64,
}

impl StoredRecord {
    pub(crate) fn from_frame(frame: LogFrame) -> Self {
        Self {
            id: frame.record_id,
            size_bytes: frame.data.len() as u64,
            record_type: frame.record_type,
            data: frame.data,
            timestamp: frame.timestamp,
        }
    }

    /// Frame that re-creates this record on its own, used by compaction.
    pub(crate) fn to_frame(&self) -> LogFrame {
        LogFrame::insert(self.id, self.timestamp, self.record_type.clone(), self.data.clone())
    }

    pub fn to_row(&self) -> RecordRow {
        RecordRow {
            id: self.id,
            record_type: self.record_type.clone(),
            data: String::from_utf8_lossy(&self.data).into_owned(),
            timestamp: self.timestamp,
        }
    }
}

/// The `(id, type, data, timestamp)` inspection row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: u64,
    #[serde(rename = "type")]
    pub record_type: String,
    pub data: String,
    pub timestamp: f64,
}

/// Details of a committed `store` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreReceipt {
    pub id: u64,
    pub record_type: String,
    pub size_bytes: u64,
    pub timestamp: f64,
    /// Ids evicted to make room, oldest first
    pub evicted: Vec<u64>,
}

/// Result of a successful `store` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StoreOutcome {
    /// Record committed
    Stored(StoreReceipt),
    /// Record exceeded the storage limit and `OversizePolicy::Drop` applied
    Dropped { size_bytes: u64 },
}

impl StoreOutcome {
    pub fn receipt(&self) -> Option<&StoreReceipt> {
        match self {
            StoreOutcome::Stored(receipt) => Some(receipt),
            StoreOutcome::Dropped { .. } => None,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, StoreOutcome::Stored(_))
    }
}

/// Point-in-time store accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub record_count: usize,
    pub current_storage: u64,
    pub storage_limit: u64,
    pub next_id: u64,
    pub log_size_bytes: u64,
}
