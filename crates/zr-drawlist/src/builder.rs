//! Encoder side of the binary format, used by tests (and available to
//! embedders who want to build drawlists in Rust rather than shipping raw
//! bytes from another process).

use crate::format::*;

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % ALIGN != 0 {
        buf.push(0);
    }
}

#[derive(Default)]
pub struct DrawlistBuilder {
    cmds: Vec<u8>,
    cmd_count: u32,
    strings_bytes: Vec<u8>,
    string_spans: Vec<(u32, u32)>,
    blobs_bytes: Vec<u8>,
    blob_spans: Vec<(u32, u32)>,
    version: u32,
}

impl DrawlistBuilder {
    pub fn new() -> Self {
        DrawlistBuilder {
            version: CURRENT_VERSION,
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    fn push_cmd(&mut self, opcode: u16, payload: &[u8]) {
        debug_assert!(payload.len() % ALIGN == 0, "payload must be 4-byte aligned");
        let size = (CMD_HEADER_SIZE + payload.len()) as u32;
        self.cmds.extend_from_slice(&opcode.to_le_bytes());
        self.cmds.extend_from_slice(&0u16.to_le_bytes()); // flags
        self.cmds.extend_from_slice(&size.to_le_bytes());
        self.cmds.extend_from_slice(payload);
        self.cmd_count += 1;
    }

    pub fn def_string(&mut self, s: &str) -> u32 {
        let offset = self.strings_bytes.len() as u32;
        self.strings_bytes.extend_from_slice(s.as_bytes());
        let idx = self.string_spans.len() as u32;
        self.string_spans.push((offset, s.len() as u32));
        idx
    }

    pub fn def_blob(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.blobs_bytes.len() as u32;
        self.blobs_bytes.extend_from_slice(bytes);
        let idx = self.blob_spans.len() as u32;
        self.blob_spans.push((offset, bytes.len() as u32));
        idx
    }

    pub fn clear(&mut self, bg_rgb: u32, flags: u32) -> &mut Self {
        let mut p = Vec::new();
        p.extend_from_slice(&bg_rgb.to_le_bytes());
        p.extend_from_slice(&flags.to_le_bytes());
        self.push_cmd(OP_CLEAR, &p);
        self
    }

    pub fn push_clip(&mut self, x: u32, y: u32, w: u32, h: u32) -> &mut Self {
        let mut p = Vec::new();
        for v in [x, y, w, h, 0, 0] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.push_cmd(OP_PUSH_CLIP, &p);
        self
    }

    pub fn pop_clip(&mut self) -> &mut Self {
        self.push_cmd(OP_POP_CLIP, &[0u8; PAYLOAD_POP_CLIP]);
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fill_rect(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        fg_rgb: u32,
        bg_rgb: u32,
        attrs: u32,
        underline_variant: u32,
        underline_rgb: u32,
    ) -> &mut Self {
        let mut p = Vec::new();
        for v in [x, y, w, h, fg_rgb, bg_rgb, attrs, underline_variant, underline_rgb, 0] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.push_cmd(OP_FILL_RECT, &p);
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        x: u32,
        y: u32,
        string_idx: u32,
        byte_len: u32,
        fg_rgb: u32,
        bg_rgb: u32,
        attrs: u32,
        underline_variant: u32,
        underline_rgb: u32,
        link_string_idx: u32,
    ) -> &mut Self {
        let mut p = Vec::new();
        for v in [
            x,
            y,
            string_idx,
            byte_len,
            fg_rgb,
            bg_rgb,
            attrs,
            underline_variant,
            underline_rgb,
            link_string_idx,
            0,
            0,
        ] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.push_cmd(OP_DRAW_TEXT, &p);
        self
    }

    pub fn set_cursor(&mut self, x: u32, y: u32, shape: u32, visible: u32, blink: u32) -> &mut Self {
        let mut p = Vec::new();
        for v in [x, y, shape, visible, blink] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.push_cmd(OP_SET_CURSOR, &p);
        self
    }

    pub fn blit_rect(&mut self, src_x: u32, src_y: u32, src_w: u32, src_h: u32, dst_x: u32, dst_y: u32) -> &mut Self {
        let mut p = Vec::new();
        for v in [src_x, src_y, src_w, src_h, dst_x, dst_y, 0, 0] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.push_cmd(OP_BLIT_RECT, &p);
        self
    }

    pub fn draw_canvas(&mut self, x: u32, y: u32, w: u32, h: u32, blob_idx: u32, blitter_mode: u32) -> &mut Self {
        let mut p = Vec::new();
        for v in [x, y, w, h, blob_idx, blitter_mode, 0, 0] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.push_cmd(OP_DRAW_CANVAS, &p);
        self
    }

    pub fn free_string(&mut self, id: u32) -> &mut Self {
        self.push_cmd(OP_FREE_STRING, &id.to_le_bytes());
        self
    }

    pub fn def_string_cmd(&mut self, id: u32, span_idx: u32) -> &mut Self {
        let mut p = Vec::new();
        p.extend_from_slice(&id.to_le_bytes());
        p.extend_from_slice(&span_idx.to_le_bytes());
        self.push_cmd(OP_DEF_STRING, &p);
        self
    }

    pub fn def_blob_cmd(&mut self, id: u32, span_idx: u32) -> &mut Self {
        let mut p = Vec::new();
        p.extend_from_slice(&id.to_le_bytes());
        p.extend_from_slice(&span_idx.to_le_bytes());
        self.push_cmd(OP_DEF_BLOB, &p);
        self
    }

    pub fn free_blob(&mut self, id: u32) -> &mut Self {
        self.push_cmd(OP_FREE_BLOB, &id.to_le_bytes());
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_image(&mut self, x: u32, y: u32, w: u32, h: u32, image_id: u32, format: u32, protocol: u32) -> &mut Self {
        let mut p = Vec::new();
        for v in [x, y, w, h, image_id, format, protocol, 0, 0, 0] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.push_cmd(OP_DRAW_IMAGE, &p);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];

        let cmd_offset = buf.len() as u32;
        buf.extend_from_slice(&self.cmds);
        pad4(&mut buf);
        let cmd_bytes = buf.len() as u32 - cmd_offset;

        let strings_span_offset = if self.string_spans.is_empty() { 0 } else { buf.len() as u32 };
        for (off, len) in &self.string_spans {
            buf.extend_from_slice(&off.to_le_bytes());
            buf.extend_from_slice(&len.to_le_bytes());
        }
        pad4(&mut buf);

        let strings_bytes_offset = if self.strings_bytes.is_empty() { 0 } else { buf.len() as u32 };
        buf.extend_from_slice(&self.strings_bytes);
        pad4(&mut buf);
        let strings_bytes_len = self.strings_bytes.len() as u32;

        let blobs_span_offset = if self.blob_spans.is_empty() { 0 } else { buf.len() as u32 };
        for (off, len) in &self.blob_spans {
            buf.extend_from_slice(&off.to_le_bytes());
            buf.extend_from_slice(&len.to_le_bytes());
        }
        pad4(&mut buf);

        let blobs_bytes_offset = if self.blobs_bytes.is_empty() { 0 } else { buf.len() as u32 };
        buf.extend_from_slice(&self.blobs_bytes);
        pad4(&mut buf);
        let blobs_bytes_len = self.blobs_bytes.len() as u32;

        let total_size = buf.len() as u32;

        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        buf[12..16].copy_from_slice(&total_size.to_le_bytes());
        buf[16..20].copy_from_slice(&cmd_offset.to_le_bytes());
        buf[20..24].copy_from_slice(&cmd_bytes.to_le_bytes());
        buf[24..28].copy_from_slice(&self.cmd_count.to_le_bytes());
        buf[28..32].copy_from_slice(&strings_span_offset.to_le_bytes());
        buf[32..36].copy_from_slice(&(self.string_spans.len() as u32).to_le_bytes());
        buf[36..40].copy_from_slice(&strings_bytes_offset.to_le_bytes());
        buf[40..44].copy_from_slice(&strings_bytes_len.to_le_bytes());
        buf[44..48].copy_from_slice(&blobs_span_offset.to_le_bytes());
        buf[48..52].copy_from_slice(&(self.blob_spans.len() as u32).to_le_bytes());
        buf[52..56].copy_from_slice(&blobs_bytes_offset.to_le_bytes());
        buf[56..60].copy_from_slice(&blobs_bytes_len.to_le_bytes());
        buf[60..64].copy_from_slice(&0u32.to_le_bytes());

        buf
    }
}
