//! RGB -> terminal color quantization for the 256-color and 16-color modes.
//! The 256-color cube thresholds and index formula are the standard xterm
//! mapping; the 16-color table is the fixed ANSI palette.

/// xterm 256-color cube: maps one 0..=255 channel to a 0..=5 cube index
/// using the standard rounding breakpoints.
fn to_6cube(v: u8) -> u8 {
    let v = v as u32;
    if v < 48 {
        0
    } else if v < 114 {
        1
    } else {
        (((v - 35) / 40).min(5)) as u8
    }
}

/// Quantizes an RGB triple to an xterm 256-color palette index (0..=255).
/// Prefers the grayscale ramp (232..=255) when the channels are close to
/// each other and the cube quantization would otherwise be a poor match;
/// otherwise falls back to the 6x6x6 color cube (16..=231).
pub fn quantize_256(r: u8, g: u8, b: u8) -> u8 {
    let close = |a: u8, b: u8| (a as i32 - b as i32).unsigned_abs() <= 8;
    if close(r, g) && close(g, b) {
        let gray = ((r as u32 + g as u32 + b as u32) / 3) as u8;
        if gray < 8 {
            return 16;
        }
        if gray > 238 {
            return 231;
        }
        let level = ((gray as u32 - 8) * 23 + 116) / 232;
        return 232 + level.min(23) as u8;
    }
    let r6 = to_6cube(r);
    let g6 = to_6cube(g);
    let b6 = to_6cube(b);
    16 + 36 * r6 + 6 * g6 + b6
}

/// The 16 fixed ANSI palette colors, in SGR order: black, red, green,
/// yellow, blue, magenta, cyan, white, then the bright variants.
const ANSI16_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (205, 0, 0),
    (0, 205, 0),
    (205, 205, 0),
    (0, 0, 238),
    (205, 0, 205),
    (0, 205, 205),
    (229, 229, 229),
    (127, 127, 127),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (92, 92, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// Quantizes to the nearest of the 16 fixed ANSI colors, returning its
/// palette index (0..=15).
pub fn quantize_16(r: u8, g: u8, b: u8) -> u8 {
    let mut best_idx = 0u8;
    let mut best_dist = u32::MAX;
    for (idx, &(pr, pg, pb)) in ANSI16_PALETTE.iter().enumerate() {
        let dr = r as i32 - pr as i32;
        let dg = g as i32 - pg as i32;
        let db = b as i32 - pb as i32;
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx as u8;
        }
    }
    best_idx
}

/// Converts a 0..=15 ANSI palette index to the SGR foreground/background
/// parameter pair, per the fixed 30-37/40-47/90-97/100-107 layout.
pub fn ansi16_sgr_params(idx: u8, is_bg: bool) -> u32 {
    let (base_low, base_high) = if is_bg { (40, 100) } else { (30, 90) };
    if idx < 8 {
        base_low + idx as u32
    } else {
        base_high + (idx - 8) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_256_matches_known_vector() {
        // fg (125,0,0) under 256-color mode quantizes to palette index 88.
        assert_eq!(quantize_256(125, 0, 0), 88);
        // pure black quantizes to palette index 16 (cube origin).
        assert_eq!(quantize_256(0, 0, 0), 16);
    }

    #[test]
    fn quantize_256_grayscale_prefers_ramp() {
        let idx = quantize_256(128, 128, 128);
        assert!((232..=255).contains(&idx));
    }

    #[test]
    fn quantize_16_picks_closest() {
        assert_eq!(quantize_16(250, 10, 10), 9); // bright red
        assert_eq!(quantize_16(0, 0, 0), 0); // black
    }

    #[test]
    fn ansi16_sgr_params_layout() {
        assert_eq!(ansi16_sgr_params(1, false), 31);
        assert_eq!(ansi16_sgr_params(1, true), 41);
        assert_eq!(ansi16_sgr_params(9, false), 91);
        assert_eq!(ansi16_sgr_params(9, true), 101);
    }
}
