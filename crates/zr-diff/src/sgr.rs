//! SGR (style) state machine: tracks the terminal's current pen and emits
//! either an absolute reset or a minimal delta to reach a target style.

use crate::color::{ansi16_sgr_params, quantize_16, quantize_256};
use zr_cell::{Attrs, Style, UnderlineVariant};
use zr_terminal::{ColorMode, PlatformCaps, SgrAttrMask};

fn rgb(v: u32) -> (u8, u8, u8) {
    (((v >> 16) & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, (v & 0xFF) as u8)
}

fn fg_piece(rgb_val: u32, mode: ColorMode) -> Option<String> {
    let (r, g, b) = rgb(rgb_val);
    match mode {
        ColorMode::Mono => None,
        ColorMode::Rgb => Some(format!("38;2;{};{};{}", r, g, b)),
        ColorMode::Ansi256 => Some(format!("38;5;{}", quantize_256(r, g, b))),
        ColorMode::Ansi16 => Some(format!("{}", ansi16_sgr_params(quantize_16(r, g, b), false))),
    }
}

fn bg_piece(rgb_val: u32, mode: ColorMode) -> Option<String> {
    let (r, g, b) = rgb(rgb_val);
    match mode {
        ColorMode::Mono => None,
        ColorMode::Rgb => Some(format!("48;2;{};{};{}", r, g, b)),
        ColorMode::Ansi256 => Some(format!("48;5;{}", quantize_256(r, g, b))),
        ColorMode::Ansi16 => Some(format!("{}", ansi16_sgr_params(quantize_16(r, g, b), true))),
    }
}

const ATTR_CODES: [(Attrs, u32); 8] = [
    (Attrs::BOLD, 1),
    (Attrs::DIM, 2),
    (Attrs::ITALIC, 3),
    (Attrs::REVERSE, 7),
    (Attrs::BLINK, 5),
    (Attrs::STRIKE, 9),
    (Attrs::OVERLINE, 53),
    (Attrs::UNDERLINE, 0), // handled separately: variant-aware
];

fn underline_piece(variant: UnderlineVariant, caps: &PlatformCaps) -> String {
    if caps.supports_underline_styles {
        format!("4:{}", variant as u8)
    } else {
        "4".to_string()
    }
}

fn attr_add_pieces(attrs: Attrs, out: &mut Vec<String>, variant: UnderlineVariant, caps: &PlatformCaps) {
    for &(flag, code) in ATTR_CODES.iter() {
        if flag == Attrs::UNDERLINE {
            continue;
        }
        if attrs.contains(flag) {
            out.push(code.to_string());
        }
    }
    if attrs.contains(Attrs::UNDERLINE) {
        out.push(underline_piece(variant, caps));
    }
}

fn colored_underline_piece(style: &Style, caps: &PlatformCaps) -> Option<String> {
    if !caps.supports_colored_underlines {
        return None;
    }
    if style.underline_rgb != 0 {
        let (r, g, b) = rgb(style.underline_rgb);
        Some(format!("58;2;{};{};{}", r, g, b))
    } else {
        None
    }
}

/// Tracks the real terminal's current style so the diff renderer can emit
/// the shortest correct sequence to reach each cell's target style.
/// `known = false` models an INVALID `STYLE` shadow field: the next
/// transition is forced absolute regardless of what `style` happens to hold.
#[derive(Debug, Clone, Copy)]
pub struct Pen {
    style: Style,
    known: bool,
}

impl Pen {
    pub fn new(initial: Style) -> Pen {
        Pen { style: initial, known: true }
    }

    pub fn new_unknown() -> Pen {
        Pen { style: Style::default(), known: false }
    }

    pub fn current(&self) -> Style {
        self.style
    }

    pub fn is_known(&self) -> bool {
        self.known
    }

    pub fn set(&mut self, style: Style) {
        self.style = style;
        self.known = true;
    }

    /// Absolute SGR sequence establishing `style` from nothing: always
    /// starts with `0` (full reset) since the prior pen state is unknown.
    pub fn absolute(style: &Style, caps: &PlatformCaps) -> Vec<u8> {
        let mut pieces = vec!["0".to_string()];
        if let Some(p) = fg_piece(style.fg_rgb, caps.color_mode) {
            pieces.push(p);
        }
        if let Some(p) = bg_piece(style.bg_rgb, caps.color_mode) {
            pieces.push(p);
        }
        attr_add_pieces(style.attrs, &mut pieces, style.underline_variant, caps);
        if let Some(p) = colored_underline_piece(style, caps) {
            pieces.push(p);
        }
        wrap_sgr(&pieces)
    }

    /// Computes the transition from the pen's current style to `target`,
    /// updates the pen, and returns the bytes to emit (empty if no change
    /// is needed).
    pub fn transition(&mut self, target: &Style, caps: &PlatformCaps) -> Vec<u8> {
        if self.known && &self.style == target {
            return Vec::new();
        }
        if !self.known {
            let bytes = Pen::absolute(target, caps);
            self.style = *target;
            self.known = true;
            return bytes;
        }
        let removed = self.style.attrs.difference(target.attrs);
        let needs_absolute = !removed.is_empty() && removed.intersects(caps.sgr_attrs_supported_as_attrs());
        let bytes = if needs_absolute {
            Pen::absolute(target, caps)
        } else {
            let mut pieces = Vec::new();
            if self.style.fg_rgb != target.fg_rgb {
                if let Some(p) = fg_piece(target.fg_rgb, caps.color_mode) {
                    pieces.push(p);
                }
            }
            if self.style.bg_rgb != target.bg_rgb {
                if let Some(p) = bg_piece(target.bg_rgb, caps.color_mode) {
                    pieces.push(p);
                }
            }
            let added = target.attrs.difference(self.style.attrs);
            attr_add_pieces(added, &mut pieces, target.underline_variant, caps);
            if target.attrs.contains(Attrs::UNDERLINE)
                && self.style.attrs.contains(Attrs::UNDERLINE)
                && self.style.underline_variant != target.underline_variant
            {
                pieces.push(underline_piece(target.underline_variant, caps));
            }
            if self.style.underline_rgb != target.underline_rgb {
                match colored_underline_piece(target, caps) {
                    Some(p) => pieces.push(p),
                    None => {
                        if caps.supports_colored_underlines {
                            pieces.push("59".to_string());
                        }
                    }
                }
            }
            if pieces.is_empty() {
                Vec::new()
            } else {
                wrap_sgr(&pieces)
            }
        };
        self.style = *target;
        bytes
    }
}

fn wrap_sgr(pieces: &[String]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pieces.len() * 4 + 3);
    out.extend_from_slice(b"\x1b[");
    out.extend_from_slice(pieces.join(";").as_bytes());
    out.push(b'm');
    out
}

/// Bridges the `sgr_attrs_supported` capability mask (over the §6 attribute
/// bit positions) into the `Attrs` bitflags type so set operations line up.
trait SgrAttrMaskExt {
    fn sgr_attrs_supported_as_attrs(&self) -> Attrs;
}

impl SgrAttrMaskExt for PlatformCaps {
    fn sgr_attrs_supported_as_attrs(&self) -> Attrs {
        Attrs::from_bits_truncate(self.sgr_attrs_supported.bits())
    }
}

#[allow(dead_code)]
fn _assert_mask_bits_align(_m: SgrAttrMask) {}

#[cfg(test)]
mod tests {
    use super::*;
    use zr_terminal::PlatformCaps;

    fn style_with(fg: u32, bg: u32, attrs: Attrs) -> Style {
        Style {
            fg_rgb: fg,
            bg_rgb: bg,
            attrs,
            underline_variant: UnderlineVariant::Plain,
            underline_rgb: 0,
            link_ref: 0,
        }
    }

    #[test]
    fn absolute_reset_matches_known_vector() {
        let caps = PlatformCaps::detect();
        let style = style_with(0xAA0000, 0x000000, Attrs::empty());
        let bytes = Pen::absolute(&style, &caps);
        assert_eq!(bytes, b"\x1b[0;38;2;170;0;0;48;2;0;0;0m");
    }

    #[test]
    fn unknown_pen_forces_absolute_even_at_default_style() {
        let caps = PlatformCaps::detect();
        let mut pen = Pen::new_unknown();
        let bytes = pen.transition(&Style::default(), &caps);
        assert_eq!(bytes, b"\x1b[0;38;2;0;0;0;48;2;0;0;0m");
    }

    #[test]
    fn no_change_emits_nothing() {
        let caps = PlatformCaps::detect();
        let style = style_with(1, 2, Attrs::BOLD);
        let mut pen = Pen::new(style);
        assert!(pen.transition(&style, &caps).is_empty());
    }

    #[test]
    fn attr_removal_forces_absolute_reset() {
        let caps = PlatformCaps::detect();
        let prev = style_with(0xAA0000, 0x000000, Attrs::BOLD);
        let next = style_with(0xAA0000, 0x000000, Attrs::empty());
        let mut pen = Pen::new(prev);
        let bytes = pen.transition(&next, &caps);
        assert_eq!(bytes, b"\x1b[0;38;2;170;0;0;48;2;0;0;0m");
    }

    #[test]
    fn color_only_change_is_deltaic() {
        let caps = PlatformCaps::detect();
        let prev = style_with(0x000000, 0x000000, Attrs::empty());
        let next = style_with(0xFF0000, 0x000000, Attrs::empty());
        let mut pen = Pen::new(prev);
        let bytes = pen.transition(&next, &caps);
        assert_eq!(bytes, b"\x1b[38;2;255;0;0m");
    }

    #[test]
    fn color_256_quantizes_both_channels() {
        let caps = PlatformCaps {
            color_mode: ColorMode::Ansi256,
            ..PlatformCaps::detect()
        };
        let style = style_with(0x7D0000, 0x000000, Attrs::empty());
        let bytes = Pen::absolute(&style, &caps);
        assert_eq!(bytes, b"\x1b[0;38;5;88;48;5;16m");
    }
}
