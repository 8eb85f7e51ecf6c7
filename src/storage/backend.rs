//! Record log backend trait

use std::fmt;

use super::errors::StorageResult;
use super::record::LogFrame;

/// Persistence behind the offline store.
///
/// Calls arrive with the store's exclusive lock held, so implementations
/// never see concurrent mutation. `append` must be all-or-nothing: on error
/// the log must replay as if the call never happened.
pub trait RecordLog: Send + Sync + fmt::Debug {
    /// Returns every committed frame in commit order.
    fn replay(&mut self) -> StorageResult<Vec<LogFrame>>;

    /// Durably appends one frame.
    fn append(&mut self, frame: &LogFrame) -> StorageResult<()>;

    /// Atomically replaces the whole log with `frames`.
    fn rewrite(&mut self, frames: &[LogFrame]) -> StorageResult<()>;

    /// Flushes anything buffered to durable media.
    fn sync(&mut self) -> StorageResult<()>;

    /// Current size of the log in bytes.
    fn size_bytes(&self) -> u64;
}

/// In-process log. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryLog {
    frames: Vec<LogFrame>,
    size_bytes: u64,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames appended since the last rewrite.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl RecordLog for MemoryLog {
    fn replay(&mut self) -> StorageResult<Vec<LogFrame>> {
        Ok(self.frames.clone())
    }

    fn append(&mut self, frame: &LogFrame) -> StorageResult<()> {
        self.size_bytes += frame.serialize().len() as u64;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn rewrite(&mut self, frames: &[LogFrame]) -> StorageResult<()> {
        self.frames = frames.to_vec();
        self.size_bytes = frames.iter().map(|f| f.serialize().len() as u64).sum();
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}
