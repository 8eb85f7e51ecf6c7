//! Log frame format
//!
//! A commit frame is one committed `store` call: the ids it evicted and the
//! record it inserted. Committing both in a single checksummed frame keeps
//! eviction and insertion all-or-nothing across crashes.
//!
//! A watermark frame ends every rewritten log. It carries the highest id
//! ever assigned and the latest commit time, so ids and timestamps keep
//! increasing even when compaction or a lowered limit dropped every record.
//! Its type, evictions and data are empty.
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, includes itself and the checksum)
//! +------------------+
//! | Kind             | (u8: 0 = commit, 1 = watermark)
//! +------------------+
//! | Record ID        | (u64 LE)
//! +------------------+
//! | Timestamp        | (f64 LE, seconds since Unix epoch)
//! +------------------+
//! | Record Type      | (length-prefixed UTF-8)
//! +------------------+
//! | Evicted Count    | (u32 LE)
//! +------------------+
//! | Evicted IDs      | (u64 LE * count)
//! +------------------+
//! | Data             | (length-prefixed canonical JSON bytes)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```

use std::io::{self, Read};

use super::checksum::compute_checksum;

/// len + kind + id + timestamp + type len + evicted count + data len + checksum
pub(crate) const MIN_FRAME_SIZE: usize = 4 + 1 + 8 + 8 + 4 + 4 + 4 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Evictions plus one inserted record
    Commit,
    /// High-water mark for ids and timestamps
    Watermark,
}

impl FrameKind {
    fn to_byte(self) -> u8 {
        match self {
            FrameKind::Commit => 0,
            FrameKind::Watermark => 1,
        }
    }

    fn from_byte(byte: u8) -> io::Result<Self> {
        match byte {
            0 => Ok(FrameKind::Commit),
            1 => Ok(FrameKind::Watermark),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown frame kind: {}", other),
            )),
        }
    }
}

/// A single committed log frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFrame {
    pub kind: FrameKind,
    /// Id assigned to the inserted record, or the highest id for a watermark
    pub record_id: u64,
    /// Commit time of the inserted record
    pub timestamp: f64,
    /// Record type of the inserted record
    pub record_type: String,
    /// Ids of records evicted to make room, oldest first
    pub evicted_ids: Vec<u64>,
    /// Canonical serialized (already redacted) payload
    pub data: Vec<u8>,
}

impl LogFrame {
    /// Create a frame for an insert that evicted nothing.
    pub fn insert(
        record_id: u64,
        timestamp: f64,
        record_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            kind: FrameKind::Commit,
            record_id,
            timestamp,
            record_type: record_type.into(),
            evicted_ids: Vec::new(),
            data,
        }
    }

    /// Create a high-water mark frame.
    pub fn watermark(last_id: u64, timestamp: f64) -> Self {
        Self {
            kind: FrameKind::Watermark,
            record_id: last_id,
            timestamp,
            record_type: String::new(),
            evicted_ids: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn is_watermark(&self) -> bool {
        self.kind == FrameKind::Watermark
    }

    /// Attach the ids evicted by this commit.
    pub fn with_evictions(mut self, evicted_ids: Vec<u64>) -> Self {
        self.evicted_ids = evicted_ids;
        self
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            1 + 8 + 8 + 4 + self.record_type.len() + 4 + self.evicted_ids.len() * 8 + 4 + self.data.len(),
        );

        buf.push(self.kind.to_byte());
        buf.extend_from_slice(&self.record_id.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());

        buf.extend_from_slice(&(self.record_type.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.record_type.as_bytes());

        buf.extend_from_slice(&(self.evicted_ids.len() as u32).to_le_bytes());
        for id in &self.evicted_ids {
            buf.extend_from_slice(&id.to_le_bytes());
        }

        buf.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.data);

        buf
    }

    /// Serialize the complete frame to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let frame_length = (4 + body.len() + 4) as u32;

        let mut frame = Vec::with_capacity(frame_length as usize);
        frame.extend_from_slice(&frame_length.to_le_bytes());
        frame.extend_from_slice(&body);

        let checksum = compute_checksum(&frame);
        frame.extend_from_slice(&checksum.to_le_bytes());

        frame
    }

    /// Deserialize a frame from bytes, verifying its checksum.
    ///
    /// Returns the frame and the number of bytes consumed. A buffer that ends
    /// before the declared frame length yields `UnexpectedEof`; anything that
    /// fails structural or checksum validation yields `InvalidData`.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < 4 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Frame length prefix truncated",
            ));
        }

        let frame_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if frame_length < MIN_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid frame length: {}", frame_length),
            ));
        }

        if data.len() < frame_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Frame truncated: expected {} bytes, got {}",
                    frame_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = frame_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = compute_checksum(&data[..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let kind = FrameKind::from_byte(read_u8(&mut cursor)?)?;
        let record_id = read_u64(&mut cursor)?;
        let timestamp = f64::from_bits(read_u64(&mut cursor)?);

        let type_bytes = read_bytes(&mut cursor)?;
        let record_type = String::from_utf8(type_bytes).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e))
        })?;

        let evicted_count = read_u32(&mut cursor)? as usize;
        let mut evicted_ids = Vec::with_capacity(evicted_count.min(1024));
        for _ in 0..evicted_count {
            evicted_ids.push(read_u64(&mut cursor)?);
        }

        let payload = read_bytes(&mut cursor)?;

        Ok((
            Self {
                kind,
                record_id,
                timestamp,
                record_type,
                evicted_ids,
                data: payload,
            },
            frame_length,
        ))
    }
}

// Reads inside a checksum-verified body: running short means the frame is
// malformed, not torn.
fn malformed(e: io::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("Malformed frame: {}", e))
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).map_err(malformed)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(malformed)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf).map_err(malformed)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut buf = Vec::new();
    reader.take(len as u64).read_to_end(&mut buf).map_err(malformed)?;
    if buf.len() != len {
        return Err(malformed(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, got {}", len, buf.len()),
        )));
    }
    Ok(buf)
}
