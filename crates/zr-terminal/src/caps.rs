//! `PlatformCaps`: everything the diff renderer needs to know about what
//! the terminal on the other end of the port can do.
//!
//! Real capability detection (XTVERSION/DA1/DA2/DECRQM probing) is out of
//! scope for this core; `PlatformCaps::conservative()` and `detect()` below
//! are thin, optimistic stubs in the same spirit as the source's own
//! scroll-region-only capability probe.

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Ansi16,
    Ansi256,
    Rgb,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SgrAttrMask: u32 {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCaps {
    pub color_mode: ColorMode,
    pub supports_mouse: bool,
    pub supports_bracketed_paste: bool,
    pub supports_focus_events: bool,
    pub supports_osc52: bool,
    pub supports_sync_update: bool,
    pub supports_scroll_region: bool,
    pub supports_cursor_shape: bool,
    pub supports_output_wait_writable: bool,
    pub supports_underline_styles: bool,
    pub supports_colored_underlines: bool,
    pub supports_hyperlinks: bool,
    pub sgr_attrs_supported: SgrAttrMask,
}

impl PlatformCaps {
    /// No assumptions beyond ANSI/CSI baseline: 16-color, no extended
    /// capabilities. Safe fallback when detection hasn't run.
    pub fn conservative() -> PlatformCaps {
        PlatformCaps {
            color_mode: ColorMode::Ansi16,
            supports_mouse: false,
            supports_bracketed_paste: false,
            supports_focus_events: false,
            supports_osc52: false,
            supports_sync_update: false,
            supports_scroll_region: false,
            supports_cursor_shape: false,
            supports_output_wait_writable: false,
            supports_underline_styles: false,
            supports_colored_underlines: false,
            supports_hyperlinks: false,
            sgr_attrs_supported: SgrAttrMask::BOLD | SgrAttrMask::UNDERLINE | SgrAttrMask::REVERSE,
        }
    }

    /// Optimistic stand-in for real probe-based detection: assumes a
    /// modern RGB-capable terminal emulator. Callers that have run a real
    /// DA1/DECRQM probe should build `PlatformCaps` directly instead.
    pub fn detect() -> PlatformCaps {
        PlatformCaps {
            color_mode: ColorMode::Rgb,
            supports_mouse: true,
            supports_bracketed_paste: true,
            supports_focus_events: true,
            supports_osc52: true,
            supports_sync_update: true,
            supports_scroll_region: true,
            supports_cursor_shape: true,
            supports_output_wait_writable: false,
            supports_underline_styles: true,
            supports_colored_underlines: true,
            supports_hyperlinks: true,
            sgr_attrs_supported: SgrAttrMask::all(),
        }
    }
}
