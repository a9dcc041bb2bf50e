//! Unicode primitives: locked-policy UTF-8 decode, grapheme segmentation,
//! and display-width classification shared by the cell framebuffer and
//! drawlist executor.

pub mod decode;
pub mod segment;
pub mod width;

pub use decode::{decode_lossy, decode_one, Decoded};
pub use segment::{normalize_and_segment, segment_bytes, Segment};
pub use width::{egc_width, scalar_width, WidthPolicy};
