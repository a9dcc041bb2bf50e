//! Pixel-to-cell lowering for `DRAW_CANVAS`. Reimplemented as a closed
//! tagged variant with one function per mode rather than dynamic dispatch;
//! `resolve_auto` is a pure function over capability/request inputs.

use zr_cell::{Style, ZrError, ZrResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitterMode {
    Auto,
    Ascii,
    Halfblock,
    Quadrant,
    Sextant,
    Braille,
    Pixel,
}

impl BlitterMode {
    pub fn from_u32(v: u32) -> Option<BlitterMode> {
        Some(match v {
            0 => BlitterMode::Auto,
            1 => BlitterMode::Ascii,
            2 => BlitterMode::Halfblock,
            3 => BlitterMode::Quadrant,
            4 => BlitterMode::Sextant,
            5 => BlitterMode::Braille,
            6 => BlitterMode::Pixel,
            _ => return None,
        })
    }
}

/// `AUTO` resolution order: dumb/pipe terminals always get `ASCII`;
/// otherwise prefer `SEXTANT` -> `QUADRANT` -> `HALFBLOCK`; `BRAILLE` is
/// only used when explicitly requested (never auto-selected); `PIXEL`
/// requires a negotiated image protocol, which this core never has.
pub fn resolve_auto(
    requested: BlitterMode,
    dumb_terminal: bool,
    pipe_mode: bool,
    supports_sextant: bool,
    supports_quadrant: bool,
) -> BlitterMode {
    if requested != BlitterMode::Auto {
        return requested;
    }
    if dumb_terminal || pipe_mode {
        return BlitterMode::Ascii;
    }
    if supports_sextant {
        BlitterMode::Sextant
    } else if supports_quadrant {
        BlitterMode::Quadrant
    } else {
        BlitterMode::Halfblock
    }
}

/// One RGBA pixel, row-major within the blob.
#[derive(Debug, Clone, Copy)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn luminance(p: Rgba) -> u32 {
    (p.r as u32 * 299 + p.g as u32 * 587 + p.b as u32 * 114) / 1000
}

/// Average `pixels[y0..y1, x0..x1]` (a sub-block within a `blob_w`-wide
/// RGBA buffer) into a single cell glyph + style, under `mode`.
///
/// `PIXEL` always returns `ERR_UNSUPPORTED`: no terminal-native image
/// protocol is negotiated by this core.
pub fn lower_block(
    pixels: &[Rgba],
    blob_w: usize,
    x0: usize,
    y0: usize,
    block_w: usize,
    block_h: usize,
    mode: BlitterMode,
) -> ZrResult<(&'static str, Style)> {
    if mode == BlitterMode::Pixel {
        return Err(ZrError::unsupported("PIXEL blitter requires a negotiated image protocol"));
    }

    let mut sum = 0u64;
    let mut count = 0u64;
    let mut avg = (0u32, 0u32, 0u32);
    for dy in 0..block_h {
        for dx in 0..block_w {
            let x = x0 + dx;
            let y = y0 + dy;
            let idx = y * blob_w + x;
            if let Some(p) = pixels.get(idx) {
                sum += luminance(*p) as u64;
                avg.0 += p.r as u32;
                avg.1 += p.g as u32;
                avg.2 += p.b as u32;
                count += 1;
            }
        }
    }
    if count == 0 {
        return Ok((" ", Style::default()));
    }
    let mean_lum = sum / count;
    let mut style = Style::default();
    style.fg_rgb = ((avg.0 / count as u32) << 16) | ((avg.1 / count as u32) << 8) | (avg.2 / count as u32);

    let glyph = match mode {
        BlitterMode::Ascii => {
            if mean_lum > 170 {
                " "
            } else if mean_lum > 85 {
                "."
            } else {
                "#"
            }
        }
        BlitterMode::Halfblock | BlitterMode::Quadrant | BlitterMode::Sextant | BlitterMode::Braille => {
            if mean_lum > 128 {
                " "
            } else {
                "█"
            }
        }
        BlitterMode::Auto | BlitterMode::Pixel => unreachable!("resolved before lowering"),
    };
    Ok((glyph, style))
}
