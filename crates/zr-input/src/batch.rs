//! Event batch binary packer: a 24-byte header followed by 16-byte record
//! headers and 4-byte-padded payloads. Overflow never leaves a partial
//! record behind; it only sets the header's `TRUNCATED` flag.

use crate::event::{Event, KeyAction, MouseKind, MouseButton};
use zr_cell::{ZrError, ZrResult};

const MAGIC: u32 = 0x5A52_4556; // 'VERZ'
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 24;
const RECORD_HEADER_SIZE: usize = 16;
const FLAG_TRUNCATED: u32 = 1;

const REC_KEY: u32 = 0;
const REC_TEXT: u32 = 1;
const REC_MOUSE: u32 = 2;
const REC_RESIZE: u32 = 3;
const REC_FOCUS: u32 = 4;
const REC_PASTE: u32 = 5;
const REC_USER: u32 = 6;
const REC_TICK: u32 = 7;

fn mouse_kind_code(kind: MouseKind) -> u32 {
    match kind {
        MouseKind::Down(_) => 0,
        MouseKind::Up(_) => 1,
        MouseKind::Drag(_) => 2,
        MouseKind::Moved => 3,
        MouseKind::WheelUp => 4,
        MouseKind::WheelDown => 5,
    }
}

fn mouse_wheel_delta(kind: MouseKind) -> (i32, i32) {
    match kind {
        MouseKind::WheelUp => (0, 1),
        MouseKind::WheelDown => (0, -1),
        _ => (0, 0),
    }
}

fn mouse_button_code(b: MouseButton) -> u32 {
    match b {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::None => 3,
    }
}

/// Encodes `ev`'s wire payload into `scratch` (cleared first) and returns
/// the record type.
fn encode_payload(ev: &Event, scratch: &mut Vec<u8>) -> u32 {
    scratch.clear();
    match ev {
        Event::Key { code, mods, action } => {
            scratch.extend_from_slice(&code.to_wire_key().to_le_bytes());
            scratch.extend_from_slice(&mods.bits().to_le_bytes());
            let action_code: u32 = match action {
                KeyAction::Press => 0,
                KeyAction::Repeat => 1,
            };
            scratch.extend_from_slice(&action_code.to_le_bytes());
            scratch.extend_from_slice(&0u32.to_le_bytes());
            REC_KEY
        }
        Event::Text(ch) => {
            scratch.extend_from_slice(&(*ch as u32).to_le_bytes());
            REC_TEXT
        }
        Event::Mouse { x, y, kind, buttons, mods } => {
            let (wheel_x, wheel_y) = mouse_wheel_delta(*kind);
            let kind_buttons = match kind {
                MouseKind::Down(b) | MouseKind::Up(b) | MouseKind::Drag(b) => mouse_button_code(*b),
                _ => *buttons,
            };
            scratch.extend_from_slice(&x.to_le_bytes());
            scratch.extend_from_slice(&y.to_le_bytes());
            scratch.extend_from_slice(&mouse_kind_code(*kind).to_le_bytes());
            scratch.extend_from_slice(&kind_buttons.to_le_bytes());
            scratch.extend_from_slice(&mods.bits().to_le_bytes());
            scratch.extend_from_slice(&wheel_x.to_le_bytes());
            scratch.extend_from_slice(&wheel_y.to_le_bytes());
            REC_MOUSE
        }
        Event::Resize { cols, rows } => {
            scratch.extend_from_slice(&(*cols as u32).to_le_bytes());
            scratch.extend_from_slice(&(*rows as u32).to_le_bytes());
            REC_RESIZE
        }
        Event::Focus { gained } => {
            scratch.extend_from_slice(&(*gained as u32).to_le_bytes());
            REC_FOCUS
        }
        Event::Paste(text) => {
            scratch.extend_from_slice(&(text.len() as u32).to_le_bytes());
            scratch.extend_from_slice(text.as_bytes());
            REC_PASTE
        }
        Event::User { tag, bytes } => {
            scratch.extend_from_slice(&tag.to_le_bytes());
            scratch.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            scratch.extend_from_slice(bytes);
            REC_USER
        }
        Event::Tick { dt_ms } => {
            scratch.extend_from_slice(&dt_ms.to_le_bytes());
            REC_TICK
        }
    }
}

/// Incrementally writes an event batch into a caller-owned buffer.
pub struct BatchWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    event_count: u32,
    truncated: bool,
}

impl<'a> BatchWriter<'a> {
    pub fn begin(buf: &'a mut [u8]) -> ZrResult<BatchWriter<'a>> {
        if buf.len() < HEADER_SIZE {
            return Err(ZrError::limit("buffer smaller than the batch header"));
        }
        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&VERSION.to_le_bytes());
        for b in &mut buf[8..HEADER_SIZE] {
            *b = 0;
        }
        Ok(BatchWriter { buf, len: HEADER_SIZE, event_count: 0, truncated: false })
    }

    /// Appends one record. Returns `false` (and marks the batch truncated)
    /// if the record would not fit; no bytes of a rejected record are ever
    /// written.
    pub fn append_record(&mut self, rec_type: u32, time_ms: u32, flags: u32, payload: &[u8]) -> bool {
        let padded = (payload.len() + 3) & !3;
        let needed = RECORD_HEADER_SIZE + padded;
        if self.len + needed > self.buf.len() {
            self.truncated = true;
            return false;
        }
        let start = self.len;
        self.buf[start..start + 4].copy_from_slice(&rec_type.to_le_bytes());
        self.buf[start + 4..start + 8].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        self.buf[start + 8..start + 12].copy_from_slice(&time_ms.to_le_bytes());
        self.buf[start + 12..start + 16].copy_from_slice(&flags.to_le_bytes());
        let payload_start = start + RECORD_HEADER_SIZE;
        self.buf[payload_start..payload_start + payload.len()].copy_from_slice(payload);
        for b in &mut self.buf[payload_start + payload.len()..start + needed] {
            *b = 0;
        }
        self.len = start + needed;
        self.event_count += 1;
        true
    }

    /// Appends one `Event`, encoding its payload via the stable wire layout.
    pub fn append_event(&mut self, ev: &Event, time_ms: u32, scratch: &mut Vec<u8>) -> bool {
        let rec_type = encode_payload(ev, scratch);
        self.append_record(rec_type, time_ms, 0, scratch)
    }

    /// Patches the header's `total_size`, `event_count`, and `flags`, and
    /// returns the total number of bytes written.
    pub fn finish(self) -> usize {
        let flags = if self.truncated { FLAG_TRUNCATED } else { 0 };
        self.buf[8..12].copy_from_slice(&(self.len as u32).to_le_bytes());
        self.buf[12..16].copy_from_slice(&self.event_count.to_le_bytes());
        self.buf[16..20].copy_from_slice(&flags.to_le_bytes());
        self.len
    }
}

/// Packs `events` (each with an associated `time_ms`) into `out` in one
/// pass. Returns the total bytes written; truncation is reflected in the
/// header flag, not as an error, since records already written remain
/// valid.
pub fn pack_batch(out: &mut [u8], events: &[(Event, u32)]) -> ZrResult<usize> {
    let mut writer = BatchWriter::begin(out)?;
    let mut scratch = Vec::new();
    for (ev, time_ms) in events {
        if !writer.append_event(ev, *time_ms, &mut scratch) {
            break;
        }
    }
    Ok(writer.finish())
}
