//! Read-side counterpart to `batch`, used mainly to verify the
//! `Decode(Encode(event_batch)) = event_batch` round-trip law; FFI callers
//! needing a read-only view of a packed batch can use it directly too.

use zr_cell::{ZrError, ZrResult};

pub const MAGIC: u32 = 0x5A52_4556;
const HEADER_SIZE: usize = 24;
const RECORD_HEADER_SIZE: usize = 16;
pub const FLAG_TRUNCATED: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchHeader {
    pub version: u32,
    pub total_size: u32,
    pub event_count: u32,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub rec_type: u32,
    pub time_ms: u32,
    pub flags: u32,
    pub payload: &'a [u8],
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

pub fn decode_header(buf: &[u8]) -> ZrResult<BatchHeader> {
    if buf.len() < HEADER_SIZE {
        return Err(ZrError::format("buffer shorter than the batch header"));
    }
    if read_u32(buf, 0) != MAGIC {
        return Err(ZrError::format("bad event batch magic"));
    }
    Ok(BatchHeader {
        version: read_u32(buf, 4),
        total_size: read_u32(buf, 8),
        event_count: read_u32(buf, 12),
        flags: read_u32(buf, 16),
    })
}

/// Iterates the records following the header. Stops silently at
/// `header.event_count` records or when the buffer runs out, whichever
/// comes first.
pub struct RecordIter<'a> {
    buf: &'a [u8],
    offset: usize,
    remaining: u32,
}

pub fn records(buf: &[u8], header: &BatchHeader) -> RecordIter<'_> {
    RecordIter { buf, offset: HEADER_SIZE, remaining: header.event_count }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<RawRecord<'a>> {
        if self.remaining == 0 || self.offset + RECORD_HEADER_SIZE > self.buf.len() {
            return None;
        }
        let rec_type = read_u32(self.buf, self.offset);
        let payload_size = read_u32(self.buf, self.offset + 4) as usize;
        let time_ms = read_u32(self.buf, self.offset + 8);
        let flags = read_u32(self.buf, self.offset + 12);
        let payload_start = self.offset + RECORD_HEADER_SIZE;
        if payload_start + payload_size > self.buf.len() {
            return None;
        }
        let payload = &self.buf[payload_start..payload_start + payload_size];
        let padded = (payload_size + 3) & !3;
        self.offset = payload_start + padded;
        self.remaining -= 1;
        Some(RawRecord { rec_type, time_ms, flags, payload })
    }
}
