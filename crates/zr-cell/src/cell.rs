//! The cell: one grid slot, holding a grapheme cluster (or a continuation
//! marker) and its style.
//!
//! Invariants, enforced by every writer (executor, blit, scroll), never by
//! the cell type itself:
//! - `width == 2` at (x, y) implies `width == 0` at (x+1, y).
//! - `width == 0` at (x, y) implies `width == 2` at (x-1, y) — no orphan
//!   continuations.
//! - A wide glyph whose continuation would land out of bounds or clipped
//!   is replaced with U+FFFD (width 1); no half-glyph is ever committed.

use crate::glyph::GlyphBuf;
use crate::style::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: GlyphBuf,
    pub width: u8,
    pub style: Style,
}

impl Cell {
    pub fn blank() -> Cell {
        Cell {
            glyph: GlyphBuf::space(),
            width: 1,
            style: Style::default(),
        }
    }

    pub fn blank_styled(style: Style) -> Cell {
        Cell {
            glyph: GlyphBuf::space(),
            width: 1,
            style,
        }
    }

    pub fn continuation(style: Style) -> Cell {
        Cell {
            glyph: GlyphBuf::EMPTY,
            width: 0,
            style,
        }
    }

    pub fn replacement(style: Style) -> Cell {
        Cell {
            glyph: GlyphBuf::replacement(),
            width: 1,
            style,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    pub fn is_lead(&self) -> bool {
        self.width == 2
    }

    pub fn visual_width(&self) -> u8 {
        if self.is_continuation() {
            0
        } else {
            self.width
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cell_is_a_single_space() {
        let c = Cell::blank();
        assert_eq!(c.glyph.as_str(), " ");
        assert_eq!(c.width, 1);
    }

    #[test]
    fn continuation_cell_has_empty_glyph_and_zero_width() {
        let c = Cell::continuation(Style::default());
        assert!(c.glyph.is_empty());
        assert!(c.is_continuation());
    }

    #[test]
    fn replacement_cell_is_u_fffd_width_one() {
        let c = Cell::replacement(Style::default());
        assert_eq!(c.glyph.as_str(), "\u{FFFD}");
        assert_eq!(c.width, 1);
    }
}
