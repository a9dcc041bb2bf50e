//! Locked UTF-8 decode policy.
//!
//! Every ill-formed byte sequence (truncated, overlong, surrogate,
//! out-of-range, lone continuation byte) decodes to U+FFFD. The policy is
//! "locked": callers must not be able to opt out of replacement, since the
//! framebuffer and drawlist invariants downstream assume every decode
//! succeeds with a displayable scalar.

/// Result of decoding one scalar (or one replacement) starting at a byte
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub scalar: char,
    pub size: usize,
    pub valid: bool,
}

const REPLACEMENT: char = '\u{FFFD}';

/// Decode one scalar value from the front of `bytes`.
///
/// Never reads past `bytes.len()`. Empty input yields `{U+FFFD, 0, false}`;
/// any other ill-formed sequence yields `{U+FFFD, 1, false}` (always
/// advancing at least one byte so callers can make forward progress).
pub fn decode_one(bytes: &[u8]) -> Decoded {
    let Some(&b0) = bytes.first() else {
        return Decoded {
            scalar: REPLACEMENT,
            size: 0,
            valid: false,
        };
    };

    if b0 < 0x80 {
        return Decoded {
            scalar: b0 as char,
            size: 1,
            valid: true,
        };
    }

    let (len, min_scalar, mut scalar) = match b0 {
        0xC2..=0xDF => (2usize, 0x80u32, (b0 as u32) & 0x1F),
        0xE0..=0xEF => (3, 0x800, (b0 as u32) & 0x0F),
        0xF0..=0xF4 => (4, 0x10000, (b0 as u32) & 0x07),
        _ => return invalid(),
    };

    if bytes.len() < len {
        return invalid();
    }
    for &cont in &bytes[1..len] {
        if cont & 0xC0 != 0x80 {
            return invalid();
        }
        scalar = (scalar << 6) | (cont as u32 & 0x3F);
    }
    if scalar < min_scalar || scalar > 0x10FFFF || (0xD800..=0xDFFF).contains(&scalar) {
        return invalid();
    }
    match char::from_u32(scalar) {
        Some(c) => Decoded {
            scalar: c,
            size: len,
            valid: true,
        },
        None => invalid(),
    }
}

fn invalid() -> Decoded {
    Decoded {
        scalar: REPLACEMENT,
        size: 1,
        valid: false,
    }
}

/// Decode a full byte slice into a lossily-valid `String`, applying the
/// locked replacement policy to every ill-formed sequence.
pub fn decode_lossy(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    while !bytes.is_empty() {
        let d = decode_one(bytes);
        out.push(d.scalar);
        bytes = &bytes[d.size.max(1).min(bytes.len())..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_decodes_directly() {
        let d = decode_one(b"A");
        assert_eq!(d, Decoded { scalar: 'A', size: 1, valid: true });
    }

    #[test]
    fn empty_input_is_zero_size_replacement() {
        let d = decode_one(b"");
        assert_eq!(d.scalar, '\u{FFFD}');
        assert_eq!(d.size, 0);
        assert!(!d.valid);
    }

    #[test]
    fn truncated_multibyte_is_replacement_size_one() {
        let d = decode_one(&[0xE2, 0x82]); // truncated euro sign
        assert_eq!(d.scalar, '\u{FFFD}');
        assert_eq!(d.size, 1);
        assert!(!d.valid);
    }

    #[test]
    fn lone_continuation_byte_is_replacement() {
        let d = decode_one(&[0x80]);
        assert_eq!(d, Decoded { scalar: '\u{FFFD}', size: 1, valid: false });
    }

    #[test]
    fn overlong_encoding_is_rejected() {
        // C0 80 would be an overlong encoding of NUL.
        let d = decode_one(&[0xC0, 0x80]);
        assert!(!d.valid);
        assert_eq!(d.size, 1);
    }

    #[test]
    fn surrogate_half_is_rejected() {
        // ED A0 80 encodes U+D800, a lone surrogate.
        let d = decode_one(&[0xED, 0xA0, 0x80]);
        assert!(!d.valid);
    }

    #[test]
    fn out_of_range_scalar_is_rejected() {
        // F4 90 80 80 encodes U+110000, past U+10FFFF.
        let d = decode_one(&[0xF4, 0x90, 0x80, 0x80]);
        assert!(!d.valid);
        assert_eq!(d.size, 1);
    }

    #[test]
    fn valid_multibyte_decodes_fully() {
        let euro = "€"; // U+20AC, 3 bytes
        let d = decode_one(euro.as_bytes());
        assert_eq!(d.scalar, '€');
        assert_eq!(d.size, 3);
        assert!(d.valid);
    }

    #[test]
    fn decode_lossy_always_terminates() {
        let bytes = [0xFF, 0xFE, b'a', 0xC2];
        let s = decode_lossy(&bytes);
        assert_eq!(s.chars().count(), 4);
    }

    proptest::proptest! {
        #[test]
        fn decode_one_never_reads_past_len(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..16)) {
            let d = decode_one(&bytes);
            proptest::prop_assert!(d.size <= bytes.len());
        }
    }
}
