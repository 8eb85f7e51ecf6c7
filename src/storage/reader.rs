//! Log reader with torn-tail detection
//!
//! Replay reads frames front to back and verifies every checksum. A frame
//! that runs past the end of the file ends the scan as a torn write, but
//! only when no intact frame starts anywhere after it: appends are fsynced
//! one at a time, so a torn frame is always the last one. A length prefix
//! that overshoots committed frames is corruption, as is a complete frame
//! that fails validation. Either aborts replay.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{LogFrame, MIN_FRAME_SIZE};

/// Outcome of scanning a log file.
#[derive(Debug, Default)]
pub struct ReplayScan {
    /// Every intact frame in file order
    pub frames: Vec<LogFrame>,
    /// Length of the intact prefix of the file
    pub valid_len: u64,
    /// Bytes after `valid_len` that belong to a torn final frame
    pub torn_bytes: u64,
}

/// Sequential frame reader.
pub struct LogReader {
    log_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl LogReader {
    /// Opens the log file for reading.
    pub fn open(log_path: &Path) -> StorageResult<Self> {
        let file = File::open(log_path).map_err(|e| {
            StorageError::read_failed(format!("Failed to open log file: {}", log_path.display()), e)
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            log_path: log_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next frame.
    ///
    /// - `Ok(Some(frame))` if a complete frame was read
    /// - `Ok(None)` at end of file or at a torn final frame
    /// - `Err(OFFLINE_DATA_CORRUPTION)` if a complete frame is invalid
    pub fn read_next(&mut self) -> StorageResult<Option<LogFrame>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < 4 {
            return Ok(None);
        }

        let mut len_buf = [0u8; 4];
        self.reader
            .read_exact(&mut len_buf)
            .map_err(|e| StorageError::read_failed("Failed to read frame length", e))?;
        let frame_length = u32::from_le_bytes(len_buf) as u64;

        if frame_length > remaining {
            return self.check_torn_tail(len_buf, frame_length, remaining);
        }

        let mut frame_buf = vec![0u8; frame_length.max(4) as usize];
        frame_buf[..4].copy_from_slice(&len_buf);
        self.reader
            .read_exact(&mut frame_buf[4..])
            .map_err(|e| StorageError::read_failed("Failed to read frame body", e))?;

        let (frame, consumed) = LogFrame::deserialize(&frame_buf).map_err(|e| {
            StorageError::corruption_at_offset(self.current_offset, e.to_string())
        })?;

        self.current_offset += consumed as u64;
        Ok(Some(frame))
    }

    /// Decides whether an overrunning frame at the current offset is a torn
    /// tail. Leaves `current_offset` at the frame start either way.
    fn check_torn_tail(
        &mut self,
        len_buf: [u8; 4],
        frame_length: u64,
        remaining: u64,
    ) -> StorageResult<Option<LogFrame>> {
        let mut tail = Vec::with_capacity(remaining as usize);
        tail.extend_from_slice(&len_buf);
        self.reader
            .read_to_end(&mut tail)
            .map_err(|e| StorageError::read_failed("Failed to read log tail", e))?;

        if let Some(next) = first_intact_frame(&tail[1..]) {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Frame length {} overruns the log, but an intact frame follows at byte_offset {}",
                    frame_length,
                    self.current_offset + 1 + next as u64
                ),
            ));
        }

        Ok(None)
    }

    /// Reads every intact frame and reports any torn tail.
    pub fn scan(&mut self) -> StorageResult<ReplayScan> {
        let mut frames = Vec::new();
        while let Some(frame) = self.read_next()? {
            frames.push(frame);
        }

        Ok(ReplayScan {
            frames,
            valid_len: self.current_offset,
            torn_bytes: self.file_size - self.current_offset,
        })
    }
}

/// Offset of the first position in `bytes` where a complete frame with a
/// valid checksum starts.
fn first_intact_frame(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < MIN_FRAME_SIZE {
        return None;
    }
    (0..=bytes.len() - MIN_FRAME_SIZE).find(|&start| LogFrame::deserialize(&bytes[start..]).is_ok())
}

/// Scans a log file that may not exist yet.
pub fn scan_log(log_path: &Path) -> StorageResult<ReplayScan> {
    match std::fs::metadata(log_path) {
        Ok(m) if m.len() == 0 => Ok(ReplayScan::default()),
        Ok(_) => LogReader::open(log_path)?.scan(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ReplayScan::default()),
        Err(e) => Err(StorageError::read_failed("Failed to read log metadata", e)),
    }
}
