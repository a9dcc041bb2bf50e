//! Platform boundary types: `PlatformCaps`, `TerminalProfile`, the shadow
//! `TerminalState`, and the `PlatformPort` trait. None of these implement
//! real terminal I/O or capability probing; that's left to an embedder.

pub mod caps;
pub mod port;
pub mod profile;
pub mod shadow;

pub use caps::{ColorMode, PlatformCaps, SgrAttrMask};
pub use port::PlatformPort;
pub use profile::TerminalProfile;
pub use shadow::{CursorShape, TerminalState, ValidFields};
