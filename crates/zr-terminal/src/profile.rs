//! `TerminalProfile`: identity information about the terminal emulator
//! in effect, separate from `PlatformCaps`' yes/no capability flags.
//! Real detection (XTVERSION/DA1/DA2 response parsing) lives outside this
//! core; this is the thin stub the engine falls back to.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalProfile {
    pub name: String,
    pub is_dumb: bool,
    pub is_pipe: bool,
}

impl TerminalProfile {
    pub fn unknown() -> TerminalProfile {
        TerminalProfile {
            name: "unknown".to_string(),
            is_dumb: false,
            is_pipe: false,
        }
    }

    pub fn dumb() -> TerminalProfile {
        TerminalProfile {
            name: "dumb".to_string(),
            is_dumb: true,
            is_pipe: false,
        }
    }

    pub fn pipe() -> TerminalProfile {
        TerminalProfile {
            name: "pipe".to_string(),
            is_dumb: false,
            is_pipe: true,
        }
    }
}
