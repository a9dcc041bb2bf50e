//! Normalized input events produced by the parser and carried through the
//! queue and batch packer.

bitflags::bitflags! {
    /// Modifier mask carried on key and mouse events. Bit order matches the
    /// CSI modifier parameter convention (`1 + sum of these bits`).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Mods: u32 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Press,
    Repeat,
}

/// Logical key identity. Named keys are assigned codepoints above the valid
/// Unicode range (`>= 0x110000`) so a single `u32` can carry either a
/// character or a named key without a tagged union in the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

const NAMED_KEY_BASE: u32 = 0x0011_0000;

impl KeyCode {
    pub fn to_wire_key(self) -> u32 {
        match self {
            KeyCode::Char(c) => c as u32,
            KeyCode::Enter => NAMED_KEY_BASE,
            KeyCode::Escape => NAMED_KEY_BASE + 1,
            KeyCode::Tab => NAMED_KEY_BASE + 2,
            KeyCode::Backspace => NAMED_KEY_BASE + 3,
            KeyCode::Up => NAMED_KEY_BASE + 4,
            KeyCode::Down => NAMED_KEY_BASE + 5,
            KeyCode::Left => NAMED_KEY_BASE + 6,
            KeyCode::Right => NAMED_KEY_BASE + 7,
            KeyCode::Home => NAMED_KEY_BASE + 8,
            KeyCode::End => NAMED_KEY_BASE + 9,
            KeyCode::PageUp => NAMED_KEY_BASE + 10,
            KeyCode::PageDown => NAMED_KEY_BASE + 11,
            KeyCode::Insert => NAMED_KEY_BASE + 12,
            KeyCode::Delete => NAMED_KEY_BASE + 13,
            KeyCode::F(n) => NAMED_KEY_BASE + 100 + n as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    Moved,
    WheelUp,
    WheelDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    Key {
        code: KeyCode,
        mods: Mods,
        action: KeyAction,
    },
    Text(char),
    Mouse {
        x: i32,
        y: i32,
        kind: MouseKind,
        buttons: u32,
        mods: Mods,
    },
    Resize {
        cols: u16,
        rows: u16,
    },
    Focus {
        gained: bool,
    },
    Paste(String),
    User {
        tag: u32,
        bytes: Vec<u8>,
    },
    Tick {
        dt_ms: u32,
    },
}

impl Event {
    pub(crate) fn payload_len(&self) -> usize {
        match self {
            Event::Paste(s) => s.len(),
            Event::User { bytes, .. } => bytes.len(),
            _ => 0,
        }
    }
}
