//! Display-width classification, pinned to Unicode 15.1 semantics.
//!
//! Combining marks contribute zero width. CJK wide ranges and
//! `EMOJI_WIDE`-policy emoji sequences contribute two. Everything else is
//! one. Grapheme-level width is the max of constituent scalar widths under
//! the active policy.

use unicode_width::UnicodeWidthChar;

/// Whether emoji-class sequences should be treated as double-width. Most
/// modern terminals render emoji at two cells; `EMOJI_WIDE` is the default
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthPolicy {
    pub emoji_wide: bool,
}

impl Default for WidthPolicy {
    fn default() -> Self {
        WidthPolicy { emoji_wide: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EgcKind {
    Ascii,
    Narrow,
    Wide,
    Emoji,
    Combining,
    Other,
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF
        | 0xFE00..=0xFE0F // variation selectors, treated as zero-width modifiers
        | 0x0483..=0x0489
    )
}

fn is_regional_indicator(c: char) -> bool {
    matches!(c as u32, 0x1F1E6..=0x1F1FF)
}

fn is_keycap_combiner(c: char) -> bool {
    c as u32 == 0x20E3
}

fn is_extended_pictographic(c: char) -> bool {
    matches!(c as u32,
        0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0x2300..=0x23FF | 0x2B00..=0x2BFF
    )
}

fn classify_char(c: char) -> EgcKind {
    if (c as u32) < 0x80 {
        return EgcKind::Ascii;
    }
    if is_combining_mark(c) {
        return EgcKind::Combining;
    }
    if is_regional_indicator(c) || is_extended_pictographic(c) {
        return EgcKind::Emoji;
    }
    match UnicodeWidthChar::width(c) {
        Some(2) => EgcKind::Wide,
        Some(_) => EgcKind::Narrow,
        None => EgcKind::Other,
    }
}

/// Width of a single scalar under the given policy. Combining marks and
/// zero-width joiners contribute 0.
pub fn scalar_width(c: char, policy: WidthPolicy) -> u16 {
    if c == '\u{200D}' {
        return 0; // ZWJ itself never advances the cursor
    }
    match classify_char(c) {
        EgcKind::Ascii | EgcKind::Narrow => 1,
        EgcKind::Wide => 2,
        EgcKind::Emoji => {
            if policy.emoji_wide {
                2
            } else {
                1
            }
        }
        EgcKind::Combining => 0,
        EgcKind::Other => 1,
    }
}

/// Width of an entire grapheme cluster: the max width of its constituent
/// scalars, with a keycap sequence (digit/pound/star + VS16 + U+20E3)
/// special-cased to width 2 under `EMOJI_WIDE`.
pub fn egc_width(cluster: &str, policy: WidthPolicy) -> u16 {
    let mut max_w = 0u16;
    let mut has_keycap = false;
    for c in cluster.chars() {
        if is_keycap_combiner(c) {
            has_keycap = true;
        }
        max_w = max_w.max(scalar_width(c, policy));
    }
    if has_keycap && policy.emoji_wide {
        return 2;
    }
    max_w.max(if cluster.is_empty() { 0 } else { 1 }).min(2)
}
