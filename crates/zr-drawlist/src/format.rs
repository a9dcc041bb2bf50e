//! Binary constants for the drawlist wire format: magic, header layout,
//! opcode ids, and the hard limits the validator enforces. Modeled as a
//! flat namespace of `pub const`s, the way binary-format headers are
//! usually pinned in this kind of crate.

/// `'ZRDL'` serialized little-endian: bytes `4C 44 52 5A`.
pub const MAGIC: u32 = 0x5A52_444C;

pub const CURRENT_VERSION: u32 = 2;

pub const HEADER_SIZE: usize = 64;
pub const ALIGN: usize = 4;

pub const CMD_HEADER_SIZE: usize = 8; // opcode:u16, flags:u16, size:u32

// --- Opcodes ---
pub const OP_CLEAR: u16 = 1;
pub const OP_PUSH_CLIP: u16 = 2;
pub const OP_POP_CLIP: u16 = 3;
pub const OP_FILL_RECT: u16 = 4;
pub const OP_DRAW_TEXT: u16 = 5;
pub const OP_DRAW_TEXT_RUN: u16 = 6;
pub const OP_DEF_STRING: u16 = 7;
pub const OP_FREE_STRING: u16 = 8;
pub const OP_DEF_BLOB: u16 = 9;
pub const OP_FREE_BLOB: u16 = 10;
pub const OP_BLIT_RECT: u16 = 11;
pub const OP_DRAW_CANVAS: u16 = 12;
pub const OP_DRAW_IMAGE: u16 = 13;
pub const OP_SET_CURSOR: u16 = 14; // v2+

// --- Fixed payload sizes (bytes, after the 8-byte cmd header) ---
pub const PAYLOAD_CLEAR: usize = 8;
pub const PAYLOAD_PUSH_CLIP: usize = 24;
pub const PAYLOAD_POP_CLIP: usize = 8;
pub const PAYLOAD_FILL_RECT: usize = 40;
pub const PAYLOAD_DRAW_TEXT: usize = 48;
pub const PAYLOAD_DRAW_TEXT_EXT: usize = 60;
pub const PAYLOAD_BLIT_RECT: usize = 32;
pub const PAYLOAD_DRAW_CANVAS: usize = 32;
pub const PAYLOAD_DRAW_IMAGE: usize = 40;
pub const PAYLOAD_SET_CURSOR: usize = 20;
pub const PAYLOAD_DEF_STRING: usize = 8;
pub const PAYLOAD_FREE_STRING: usize = 4;
pub const PAYLOAD_DEF_BLOB: usize = 8;
pub const PAYLOAD_FREE_BLOB: usize = 4;
pub const TEXT_RUN_HEADER: usize = 16; // x:u32, y:u32, segment_count:u32, reserved0:u32
pub const TEXT_RUN_SEGMENT_SIZE: usize = 16; // string_idx:u32, fg_rgb:u32, bg_rgb:u32, attrs:u32

// DRAW_IMAGE payload (40 bytes): x, y, w, h, image_id, format, protocol,
// reserved0, reserved1, reserved2. `image_id` references a blob registered
// with DEF_BLOB, threaded across drawlists via `ResourceTables` rather than
// the current drawlist's own blob span table (images typically outlive the
// drawlist that first defines them).
pub const IMAGE_FORMAT_RGBA8: u32 = 0;
pub const IMAGE_FORMAT_PNG: u32 = 1;
pub const IMAGE_PROTOCOL_NONE: u32 = 0;

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_cmds: u32,
    pub max_strings: u32,
    pub max_blobs: u32,
    pub max_total_bytes: u32,
    pub max_clip_depth: u32,
    pub max_text_run_segments: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_cmds: 1 << 16,
            max_strings: 1 << 14,
            max_blobs: 1 << 12,
            max_total_bytes: 16 << 20,
            max_clip_depth: 64,
            max_text_run_segments: 4096,
        }
    }
}
