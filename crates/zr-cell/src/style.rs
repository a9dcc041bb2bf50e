//! Per-cell style: colors, attribute bitfield, underline variant, and the
//! interned link reference. Bit positions match the VT/ANSI output dialect
//! pinned for the diff renderer.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attrs: u32 {
        const BOLD      = 1 << 0;
        const ITALIC    = 1 << 1;
        const UNDERLINE = 1 << 2;
        const REVERSE   = 1 << 3;
        const DIM       = 1 << 4;
        const STRIKE    = 1 << 5;
        const OVERLINE  = 1 << 6;
        const BLINK     = 1 << 7;
    }
}

/// Underline rendering variant, carried alongside `Attrs::UNDERLINE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum UnderlineVariant {
    #[default]
    Plain = 0,
    Single = 1,
    Double = 2,
    Curly = 3,
    Dotted = 4,
    Dashed = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub fg_rgb: u32,
    pub bg_rgb: u32,
    pub attrs: Attrs,
    pub underline_variant: UnderlineVariant,
    pub underline_rgb: u32,
    /// 0 means "no link"; otherwise a 1-based ref into the framebuffer's
    /// link table.
    pub link_ref: u32,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            fg_rgb: 0,
            bg_rgb: 0,
            attrs: Attrs::empty(),
            underline_variant: UnderlineVariant::default(),
            underline_rgb: 0,
            link_ref: 0,
        }
    }
}

impl Style {
    pub fn has_link(&self) -> bool {
        self.link_ref != 0
    }
}
