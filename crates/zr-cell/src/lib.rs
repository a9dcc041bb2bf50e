//! Cell/framebuffer data model: the grid, its invariants, the interned
//! link table, damage accumulation, and the bump arena shared by the
//! drawlist executor and engine orchestration.

pub mod arena;
pub mod cell;
pub mod damage;
pub mod error;
pub mod framebuffer;
pub mod glyph;
pub mod link;
pub mod painter;
pub mod rect;
pub mod style;

pub use arena::{Arena, ArenaHandle};
pub use cell::Cell;
pub use damage::Damage;
pub use error::{ZrError, ZrResult};
pub use framebuffer::Framebuffer;
pub use glyph::GlyphBuf;
pub use link::{LinkRecord, LinkTable};
pub use painter::Painter;
pub use rect::Rect;
pub use style::{Attrs, Style, UnderlineVariant};
