//! Platform-agnostic input pipeline: a streaming VT/ANSI byte parser, a
//! bounded event queue with coalescing, and a binary event batch packer.

pub mod batch;
pub mod decode;
pub mod event;
pub mod parser;
pub mod queue;

pub use batch::{pack_batch, BatchWriter};
pub use event::{Event, KeyAction, KeyCode, Mods, MouseButton, MouseKind};
pub use parser::Parser;
pub use queue::EventQueue;
