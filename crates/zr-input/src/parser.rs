//! Incremental byte-to-`Event` parser. `parse_bytes_prefix` consumes as much
//! of `bytes` as it can fully interpret and reports how many bytes were
//! consumed; the caller keeps the unconsumed tail and prepends it to the
//! next platform read. A bracketed-paste body is the one piece of state
//! that spans calls, so it lives on `Parser` itself rather than in the tail.

use crate::event::{Event, KeyAction, KeyCode, Mods, MouseButton, MouseKind};

const ESC: u8 = 0x1B;

#[derive(Debug)]
enum Mode {
    Normal,
    Paste(Vec<u8>),
}

/// Streaming VT/ANSI input parser. One instance per platform port; bytes
/// from successive reads are fed in without ever being replayed.
pub struct Parser {
    mode: Mode,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser { mode: Mode::Normal }
    }

    /// Parses as much of `bytes` as forms complete events, appending them to
    /// `events` in order. Returns the number of bytes consumed; any
    /// remaining suffix is an incomplete prefix the caller must retain.
    pub fn parse_bytes_prefix(&mut self, bytes: &[u8], events: &mut Vec<Event>) -> usize {
        let mut i = 0;
        while i < bytes.len() {
            let rest = &bytes[i..];
            let consumed = if let Mode::Paste(_) = self.mode {
                self.parse_paste_chunk(rest, events)
            } else {
                self.parse_one(rest, events)
            };
            if consumed == 0 {
                break;
            }
            i += consumed;
        }
        i
    }

    fn parse_paste_chunk(&mut self, buf: &[u8], events: &mut Vec<Event>) -> usize {
        const TERM: &[u8] = b"\x1b[201~";
        if buf[0] == ESC {
            if buf.len() < TERM.len() {
                if TERM.starts_with(buf) {
                    return 0; // incomplete terminator, wait for more bytes
                }
                // Starts with ESC but cannot possibly be the terminator: fall
                // through and treat as ordinary paste content below.
            } else if buf.starts_with(TERM) {
                if let Mode::Paste(body) = std::mem::replace(&mut self.mode, Mode::Normal) {
                    let text = String::from_utf8_lossy(&body).into_owned();
                    events.push(Event::Paste(text));
                }
                return TERM.len();
            }
        }
        if let Mode::Paste(body) = &mut self.mode {
            body.push(buf[0]);
        }
        1
    }

    fn parse_one(&mut self, buf: &[u8], events: &mut Vec<Event>) -> usize {
        match buf[0] {
            ESC => self.parse_escape(buf, events),
            b'\r' => {
                events.push(Event::Key { code: KeyCode::Enter, mods: Mods::empty(), action: KeyAction::Press });
                1
            }
            b'\t' => {
                events.push(Event::Key { code: KeyCode::Tab, mods: Mods::empty(), action: KeyAction::Press });
                1
            }
            0x7F => {
                events.push(Event::Key { code: KeyCode::Backspace, mods: Mods::empty(), action: KeyAction::Press });
                1
            }
            b => self.parse_utf8(buf, b, events),
        }
    }

    fn parse_utf8(&mut self, buf: &[u8], lead: u8, events: &mut Vec<Event>) -> usize {
        let width = utf8_width(lead);
        if buf.len() < width {
            return 0; // incomplete trailing sequence
        }
        match std::str::from_utf8(&buf[..width]) {
            Ok(s) => {
                let ch = s.chars().next().expect("non-empty decode");
                events.push(Event::Text(ch));
                width
            }
            Err(_) => {
                events.push(Event::Text('\u{FFFD}'));
                1
            }
        }
    }

    fn parse_escape(&mut self, buf: &[u8], events: &mut Vec<Event>) -> usize {
        if buf.len() < 2 {
            return 0; // ambiguous: bare Escape vs. start of a sequence
        }
        match buf[1] {
            b'[' => self.parse_csi(buf, events),
            b'O' => self.parse_ss3(buf, events),
            _ => {
                events.push(Event::Key { code: KeyCode::Escape, mods: Mods::empty(), action: KeyAction::Press });
                1
            }
        }
    }

    fn parse_ss3(&mut self, buf: &[u8], events: &mut Vec<Event>) -> usize {
        if buf.len() < 3 {
            return 0;
        }
        let code = match buf[2] {
            b'P' => Some(KeyCode::F(1)),
            b'Q' => Some(KeyCode::F(2)),
            b'R' => Some(KeyCode::F(3)),
            b'S' => Some(KeyCode::F(4)),
            b'A' => Some(KeyCode::Up),
            b'B' => Some(KeyCode::Down),
            b'C' => Some(KeyCode::Right),
            b'D' => Some(KeyCode::Left),
            _ => None,
        };
        if let Some(code) = code {
            events.push(Event::Key { code, mods: Mods::empty(), action: KeyAction::Press });
        }
        3
    }

    fn parse_csi(&mut self, buf: &[u8], events: &mut Vec<Event>) -> usize {
        // buf = ESC '[' ... final ; find the final byte in 0x40..=0x7E.
        let mut end = 2;
        while end < buf.len() && !(0x40..=0x7E).contains(&buf[end]) {
            end += 1;
        }
        if end >= buf.len() {
            return 0; // no final byte yet
        }
        let final_byte = buf[end];
        let params = &buf[2..end];
        let consumed = end + 1;

        if !params.is_empty() && params[0] == b'<' {
            self.parse_sgr_mouse(&params[1..], final_byte, events);
            return consumed;
        }

        let fields: Vec<&[u8]> = split_params(params);

        if final_byte == b'~' {
            let code = fields.first().and_then(|f| parse_u32(f));
            match code {
                Some(200) => {
                    self.mode = Mode::Paste(Vec::new());
                }
                Some(201) => {
                    // Stray end marker outside paste mode; ignore.
                }
                Some(n) => {
                    if let Some(key) = tilde_key(n) {
                        let mods = fields.get(1).and_then(|f| parse_u32(f)).map(mods_from_param).unwrap_or_default();
                        events.push(Event::Key { code: key, mods, action: KeyAction::Press });
                    }
                }
                None => {}
            }
            return consumed;
        }

        let mods = fields.get(1).and_then(|f| parse_u32(f)).map(mods_from_param).unwrap_or_default();
        let code = match final_byte {
            b'A' => Some(KeyCode::Up),
            b'B' => Some(KeyCode::Down),
            b'C' => Some(KeyCode::Right),
            b'D' => Some(KeyCode::Left),
            b'H' => Some(KeyCode::Home),
            b'F' => Some(KeyCode::End),
            _ => None,
        };
        if let Some(code) = code {
            events.push(Event::Key { code, mods, action: KeyAction::Press });
        }
        consumed
    }

    fn parse_sgr_mouse(&mut self, params: &[u8], final_byte: u8, events: &mut Vec<Event>) {
        let fields = split_params(params);
        let base = fields.first().and_then(|f| parse_u32(f)).unwrap_or(0);
        let x = fields.get(1).and_then(|f| parse_u32(f)).unwrap_or(1).saturating_sub(1) as i32;
        let y = fields.get(2).and_then(|f| parse_u32(f)).unwrap_or(1).saturating_sub(1) as i32;

        let mods = Mods::from_bits_truncate(
            (if base & 4 != 0 { Mods::SHIFT.bits() } else { 0 })
                | (if base & 8 != 0 { Mods::ALT.bits() } else { 0 })
                | (if base & 16 != 0 { Mods::CTRL.bits() } else { 0 }),
        );

        let button_bits = base & 0b11;
        let is_motion = base & 32 != 0;
        let is_wheel = base & 64 != 0;
        let released = final_byte == b'm';

        let kind = if is_wheel {
            if button_bits == 0 { MouseKind::WheelUp } else { MouseKind::WheelDown }
        } else {
            let button = match button_bits {
                0 => MouseButton::Left,
                1 => MouseButton::Middle,
                2 => MouseButton::Right,
                _ => MouseButton::None,
            };
            if is_motion {
                MouseKind::Drag(button)
            } else if released {
                MouseKind::Up(button)
            } else if button_bits == 3 {
                MouseKind::Moved
            } else {
                MouseKind::Down(button)
            }
        };

        events.push(Event::Mouse { x, y, kind, buttons: button_bits, mods });
    }
}

fn mods_from_param(p: u32) -> Mods {
    let bits = p.saturating_sub(1);
    Mods::from_bits_truncate(bits & Mods::all().bits())
}

fn tilde_key(n: u32) -> Option<KeyCode> {
    Some(match n {
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        7 => KeyCode::Home,
        8 => KeyCode::End,
        11 => KeyCode::F(1),
        12 => KeyCode::F(2),
        13 => KeyCode::F(3),
        14 => KeyCode::F(4),
        15 => KeyCode::F(5),
        17 => KeyCode::F(6),
        18 => KeyCode::F(7),
        19 => KeyCode::F(8),
        20 => KeyCode::F(9),
        21 => KeyCode::F(10),
        23 => KeyCode::F(11),
        24 => KeyCode::F(12),
        _ => return None,
    })
}

fn split_params(params: &[u8]) -> Vec<&[u8]> {
    params.split(|&b| b == b';').collect()
}

fn parse_u32(field: &[u8]) -> Option<u32> {
    if field.is_empty() {
        return None;
    }
    std::str::from_utf8(field).ok()?.parse().ok()
}

fn utf8_width(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1 // invalid lead byte: consume just it, caller reports U+FFFD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(bytes: &[u8]) -> (usize, Vec<Event>) {
        let mut p = Parser::new();
        let mut events = Vec::new();
        let consumed = p.parse_bytes_prefix(bytes, &mut events);
        (consumed, events)
    }

    #[test]
    fn ascii_text_round_trips() {
        let (consumed, events) = parse_all(b"hi");
        assert_eq!(consumed, 2);
        assert_eq!(events, vec![Event::Text('h'), Event::Text('i')]);
    }

    #[test]
    fn invalid_utf8_becomes_replacement_char() {
        let (consumed, events) = parse_all(&[0xFF]);
        assert_eq!(consumed, 1);
        assert_eq!(events, vec![Event::Text('\u{FFFD}')]);
    }

    #[test]
    fn incomplete_utf8_tail_consumes_nothing() {
        let (consumed, events) = parse_all(&[0xE2, 0x82]); // partial € (E2 82 AC)
        assert_eq!(consumed, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn incomplete_csi_prefix_consumes_nothing() {
        let (consumed, events) = parse_all(b"\x1b[1;5");
        assert_eq!(consumed, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn arrow_key_with_ctrl_modifier() {
        let (consumed, events) = parse_all(b"\x1b[1;5A");
        assert_eq!(consumed, 6);
        assert_eq!(events, vec![Event::Key { code: KeyCode::Up, mods: Mods::CTRL, action: KeyAction::Press }]);
    }

    #[test]
    fn ss3_f1_key() {
        let (consumed, events) = parse_all(b"\x1bOP");
        assert_eq!(consumed, 3);
        assert_eq!(events, vec![Event::Key { code: KeyCode::F(1), mods: Mods::empty(), action: KeyAction::Press }]);
    }

    #[test]
    fn bare_escape_at_end_of_buffer_is_incomplete() {
        let (consumed, events) = parse_all(b"\x1b");
        assert_eq!(consumed, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn sgr_mouse_left_press() {
        let (consumed, events) = parse_all(b"\x1b[<0;11;21M");
        assert_eq!(consumed, 11);
        assert_eq!(
            events,
            vec![Event::Mouse { x: 10, y: 20, kind: MouseKind::Down(MouseButton::Left), buttons: 0, mods: Mods::empty() }]
        );
    }

    #[test]
    fn sgr_mouse_wheel_up() {
        let (_, events) = parse_all(b"\x1b[<64;5;5M");
        assert_eq!(events, vec![Event::Mouse { x: 4, y: 4, kind: MouseKind::WheelUp, buttons: 0, mods: Mods::empty() }]);
    }

    #[test]
    fn bracketed_paste_assembles_single_event_across_calls() {
        let mut p = Parser::new();
        let mut events = Vec::new();
        let c1 = p.parse_bytes_prefix(b"\x1b[200~hel", &mut events);
        assert_eq!(c1, b"\x1b[200~hel".len());
        assert!(events.is_empty());
        let c2 = p.parse_bytes_prefix(b"lo\x1b[201~", &mut events);
        assert_eq!(c2, b"lo\x1b[201~".len());
        assert_eq!(events, vec![Event::Paste("hello".to_string())]);
    }

    #[test]
    fn paste_terminator_split_across_reads() {
        let mut p = Parser::new();
        let mut events = Vec::new();
        let first = b"\x1b[200~ab\x1b[20";
        let consumed = p.parse_bytes_prefix(first, &mut events);
        assert!(events.is_empty());
        // Caller retains the unconsumed tail and prepends it to the next read.
        let mut retained = first[consumed..].to_vec();
        retained.extend_from_slice(b"1~");
        let rest = p.parse_bytes_prefix(&retained, &mut events);
        assert_eq!(rest, retained.len());
        assert_eq!(events, vec![Event::Paste("ab".to_string())]);
    }
}
