//! Shadow `TerminalState`: the engine's belief about what the real
//! terminal currently shows, so the diff renderer knows what must be
//! re-established from scratch versus what can be emitted as a delta.

use bitflags::bitflags;
use zr_cell::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Block,
    Underline,
    Bar,
}

bitflags! {
    /// Bit set per-field: set means the field is VALID (known to match
    /// the real terminal); clear means INVALID and must be re-established
    /// before the diff renderer may assume anything about it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValidFields: u8 {
        const CURSOR_POS   = 1 << 0;
        const STYLE        = 1 << 1;
        const CURSOR_VIS   = 1 << 2;
        const CURSOR_SHAPE = 1 << 3;
        const SCREEN       = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalState {
    pub cursor_x: u16,
    pub cursor_y: u16,
    pub cursor_visible: bool,
    pub cursor_shape: CursorShape,
    pub cursor_blink: bool,
    pub style: Style,
    pub valid: ValidFields,
}

impl TerminalState {
    /// Startup/resize state: nothing known, everything must be
    /// re-established before the diff renderer can emit deltas.
    pub fn unknown() -> TerminalState {
        TerminalState {
            cursor_x: 0,
            cursor_y: 0,
            cursor_visible: true,
            cursor_shape: CursorShape::Block,
            cursor_blink: false,
            style: Style::default(),
            valid: ValidFields::empty(),
        }
    }

    pub fn is_valid(&self, field: ValidFields) -> bool {
        self.valid.contains(field)
    }

    pub fn mark_valid(&mut self, field: ValidFields) {
        self.valid.insert(field);
    }

    pub fn invalidate_all(&mut self) {
        self.valid = ValidFields::empty();
    }
}
