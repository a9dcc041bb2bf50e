//! Binary drawlist format: validator (bytes -> read-only `View`) and
//! executor (`View` -> framebuffer mutations).

pub mod blitter;
pub mod builder;
pub mod cursor;
pub mod exec;
pub mod format;
pub mod resources;
pub mod validate;
pub mod view;

pub use builder::DrawlistBuilder;
pub use cursor::{CursorShape, CursorState};
pub use exec::{execute, ExecContext};
pub use format::Limits;
pub use resources::ResourceTables;
pub use validate::validate;
pub use view::View;
