//! Record log persistence for the offline store
//!
//! The log is the durable half of the store: an append-only sequence of
//! checksummed frames, each describing one committed `store` call.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates)
//! - One frame per commit, carrying its evictions and its insert
//! - Checksum-verified on replay
//! - Torn final frames are discarded; complete bad frames halt replay
//! - Compaction rewrites the log to the live records only

mod backend;
mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use backend::{MemoryLog, RecordLog};
pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{StorageError, StorageErrorCode, StorageResult};
pub use reader::{scan_log, LogReader, ReplayScan};
pub use record::{FrameKind, LogFrame};
pub use writer::FileLog;
