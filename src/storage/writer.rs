//! File-backed record log
//!
//! `<data_dir>/data/records.log` is append-only with fsync after every
//! frame. Evicted records are never erased in place; the eviction is
//! recorded in the frame that caused it and the bytes are reclaimed by
//! `rewrite` (compaction).

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::backend::RecordLog;
use super::errors::{StorageError, StorageResult};
use super::reader::scan_log;
use super::record::LogFrame;
use crate::observability::{log_event_with_fields, Event};

const LOG_FILE_NAME: &str = "records.log";
const COMPACT_FILE_NAME: &str = "records.log.compact";

/// Append-only log file with fsync enforcement.
#[derive(Debug)]
pub struct FileLog {
    log_path: PathBuf,
    file: File,
    current_offset: u64,
}

impl FileLog {
    /// Opens or creates `<data_dir>/data/records.log`.
    ///
    /// Creates parent directories if needed. Does not read the log; replay
    /// happens when the store opens on top of it.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let data_subdir = data_dir.join("data");
        let log_path = data_subdir.join(LOG_FILE_NAME);

        if !data_subdir.exists() {
            fs::create_dir_all(&data_subdir).map_err(|e| {
                StorageError::append_failed(
                    format!("Failed to create data directory: {}", data_subdir.display()),
                    e,
                )
            })?;
        }

        let file = Self::open_append(&log_path)?;
        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            log_path,
            file,
            current_offset,
        })
    }

    /// Path of the log file for a data directory.
    pub fn log_path_for(data_dir: &Path) -> PathBuf {
        data_dir.join("data").join(LOG_FILE_NAME)
    }

    fn open_append(path: &Path) -> StorageResult<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                StorageError::append_failed(
                    format!("Failed to open log file: {}", path.display()),
                    e,
                )
            })
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Returns the current end-of-log offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Cuts the file back to `len` bytes and fsyncs.
    fn truncate_to(&mut self, len: u64) -> StorageResult<()> {
        self.file.set_len(len).map_err(|e| {
            StorageError::rewrite_failed(format!("Failed to truncate log to {} bytes", len), e)
        })?;
        self.file
            .sync_all()
            .map_err(|e| StorageError::rewrite_failed("fsync failed after truncation", e))?;
        self.current_offset = len;
        Ok(())
    }
}

impl RecordLog for FileLog {
    fn replay(&mut self) -> StorageResult<Vec<LogFrame>> {
        let scan = scan_log(&self.log_path)?;

        if scan.torn_bytes > 0 {
            let torn_bytes = scan.torn_bytes.to_string();
            let valid_len = scan.valid_len.to_string();
            log_event_with_fields(
                Event::TornTailDiscarded,
                &[("torn_bytes", &torn_bytes), ("valid_len", &valid_len)],
            );
            self.truncate_to(scan.valid_len)?;
        }

        self.current_offset = scan.valid_len;
        Ok(scan.frames)
    }

    fn append(&mut self, frame: &LogFrame) -> StorageResult<()> {
        let serialized = frame.serialize();
        let start = self.current_offset;

        let written = self
            .file
            .write_all(&serialized)
            .and_then(|_| self.file.sync_all());

        if let Err(e) = written {
            // Best effort: leave no partial frame behind. Replay would treat
            // one as a torn tail anyway.
            let _ = self.file.set_len(start);
            return Err(StorageError::append_failed(
                format!("Failed to append frame for record {}", frame.record_id),
                e,
            ));
        }

        self.current_offset += serialized.len() as u64;
        Ok(())
    }

    fn rewrite(&mut self, frames: &[LogFrame]) -> StorageResult<()> {
        let compact_path = self.log_path.with_file_name(COMPACT_FILE_NAME);

        let mut bytes = Vec::new();
        for frame in frames {
            bytes.extend_from_slice(&frame.serialize());
        }

        {
            let mut tmp = File::create(&compact_path).map_err(|e| {
                StorageError::rewrite_failed(
                    format!("Failed to create {}", compact_path.display()),
                    e,
                )
            })?;
            tmp.write_all(&bytes)
                .and_then(|_| tmp.sync_all())
                .map_err(|e| StorageError::rewrite_failed("Failed to write compacted log", e))?;
        }

        fs::rename(&compact_path, &self.log_path).map_err(|e| {
            StorageError::rewrite_failed("Failed to replace log with compacted copy", e)
        })?;

        if let Some(parent) = self.log_path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        self.file = Self::open_append(&self.log_path)?;
        self.current_offset = bytes.len() as u64;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file
            .sync_all()
            .map_err(|e| StorageError::append_failed("fsync failed", e))
    }

    fn size_bytes(&self) -> u64 {
        self.current_offset
    }
}
