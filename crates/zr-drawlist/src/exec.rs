//! Interprets a validated `View` into framebuffer mutations.
//!
//! No-partial-effects on failure is the caller's responsibility (the
//! engine executes against a scratch copy of `fb_next` and only commits it
//! on success) — this function simply stops at the first error.

use crate::cursor::{CursorShape, CursorState};
use crate::format::*;
use crate::resources::ResourceTables;
use crate::view::{read_u32, View};
use crate::blitter::{self, BlitterMode, Rgba};
use zr_cell::{Attrs, Framebuffer, Painter, Rect, Style, UnderlineVariant, ZrError, ZrResult};
use zr_text::WidthPolicy;

pub struct ExecContext<'a> {
    pub fb: &'a mut Framebuffer,
    pub cursor: &'a mut CursorState,
    pub resources: &'a mut ResourceTables,
    pub width_policy: WidthPolicy,
    pub limits: Limits,
    pub dumb_terminal: bool,
    pub pipe_mode: bool,
    pub supports_sextant: bool,
    pub supports_quadrant: bool,
    /// Scratch buffer `DRAW_IMAGE` copies into when a native image protocol
    /// is negotiated (`protocol != IMAGE_PROTOCOL_NONE`); emitting the
    /// protocol-specific escape sequence from it is the image pipeline's
    /// job, out of scope here. `image_staging_cap == 0` means the caller
    /// configured no staging buffer at all.
    pub image_staging: &'a mut Vec<u8>,
    pub image_staging_cap: usize,
}

fn underline_variant_from_u32(v: u32) -> UnderlineVariant {
    match v {
        1 => UnderlineVariant::Single,
        2 => UnderlineVariant::Double,
        3 => UnderlineVariant::Curly,
        4 => UnderlineVariant::Dotted,
        5 => UnderlineVariant::Dashed,
        _ => UnderlineVariant::Plain,
    }
}

fn style_from_fields(fg: u32, bg: u32, attrs: u32, underline_variant: u32, underline_rgb: u32) -> Style {
    Style {
        fg_rgb: fg,
        bg_rgb: bg,
        attrs: Attrs::from_bits_truncate(attrs),
        underline_variant: underline_variant_from_u32(underline_variant),
        underline_rgb,
        link_ref: 0,
    }
}

pub fn execute(view: &View, ctx: &mut ExecContext) -> ZrResult<()> {
    let mut painter = Painter::new(ctx.fb);
    let mut clip_depth: u32 = 0;

    for cmd in &view.cmds {
        let p = view.cmd_payload(cmd);
        match cmd.header.opcode {
            OP_CLEAR => {
                let bg = read_u32(p, 0).unwrap();
                painter.framebuffer_mut().clear(Style {
                    bg_rgb: bg,
                    ..Style::default()
                });
            }
            OP_PUSH_CLIP => {
                clip_depth += 1;
                if clip_depth > ctx.limits.max_clip_depth {
                    return Err(ZrError::limit("clip depth exceeds max_clip_depth"));
                }
                let x = read_u32(p, 0).unwrap() as u16;
                let y = read_u32(p, 4).unwrap() as u16;
                let w = read_u32(p, 8).unwrap();
                let h = read_u32(p, 12).unwrap();
                if w == 0 || h == 0 {
                    return Err(ZrError::invalid_argument("PUSH_CLIP zero-dimension rect"));
                }
                let rect = Rect::new(x, y, x + w as u16 - 1, y + h as u16 - 1);
                painter.push_clip(rect)?;
            }
            OP_POP_CLIP => {
                if clip_depth == 0 {
                    return Err(ZrError::invalid_argument("POP_CLIP without matching PUSH_CLIP"));
                }
                clip_depth -= 1;
                painter.pop_clip()?;
            }
            OP_FILL_RECT => {
                let x = read_u32(p, 0).unwrap() as u16;
                let y = read_u32(p, 4).unwrap() as u16;
                let w = read_u32(p, 8).unwrap();
                let h = read_u32(p, 12).unwrap();
                let fg = read_u32(p, 16).unwrap();
                let bg = read_u32(p, 20).unwrap();
                let attrs = read_u32(p, 24).unwrap();
                let uv = read_u32(p, 28).unwrap();
                let urgb = read_u32(p, 32).unwrap();
                if w == 0 || h == 0 {
                    return Err(ZrError::invalid_argument("FILL_RECT zero-dimension rect"));
                }
                let rect = Rect::new(x, y, x + w as u16 - 1, y + h as u16 - 1);
                painter.fill_rect(rect, style_from_fields(fg, bg, attrs, uv, urgb));
            }
            OP_DRAW_TEXT => {
                let x = read_u32(p, 0).unwrap() as u16;
                let y = read_u32(p, 4).unwrap() as u16;
                let string_idx = read_u32(p, 8).unwrap();
                let fg = read_u32(p, 16).unwrap();
                let bg = read_u32(p, 20).unwrap();
                let attrs = read_u32(p, 24).unwrap();
                let uv = read_u32(p, 28).unwrap();
                let urgb = read_u32(p, 32).unwrap();
                let link_string_idx = read_u32(p, 36).unwrap();

                let mut style = style_from_fields(fg, bg, attrs, uv, urgb);
                if link_string_idx != 0 {
                    if let Some(uri_bytes) = view.string_bytes(link_string_idx as usize - 1) {
                        let uri = String::from_utf8_lossy(uri_bytes).to_string();
                        style.link_ref = painter.framebuffer_mut().link_intern(&uri, "").unwrap_or(0);
                    }
                }

                let bytes = view
                    .string_bytes(string_idx as usize)
                    .ok_or_else(|| ZrError::format("DRAW_TEXT references unknown string"))?;
                draw_text_bytes(&mut painter, x, y, bytes, style, ctx.width_policy);
            }
            OP_DRAW_TEXT_RUN => {
                let x0 = read_u32(p, 0).unwrap() as u16;
                let y = read_u32(p, 4).unwrap() as u16;
                let segment_count = read_u32(p, 8).unwrap();
                let mut x = x0;
                for i in 0..segment_count {
                    let seg_off = TEXT_RUN_HEADER + i as usize * TEXT_RUN_SEGMENT_SIZE;
                    let string_idx = read_u32(p, seg_off).unwrap();
                    let fg = read_u32(p, seg_off + 4).unwrap();
                    let bg = read_u32(p, seg_off + 8).unwrap();
                    let attrs = read_u32(p, seg_off + 12).unwrap();
                    let style = style_from_fields(fg, bg, attrs, 0, 0);
                    let bytes = view
                        .string_bytes(string_idx as usize)
                        .ok_or_else(|| ZrError::format("DRAW_TEXT_RUN segment references unknown string"))?;
                    x = draw_text_bytes(&mut painter, x, y, bytes, style, ctx.width_policy);
                }
            }
            OP_DEF_STRING => {
                let id = read_u32(p, 0).unwrap();
                let span_idx = read_u32(p, 4).unwrap();
                let bytes = view
                    .string_bytes(span_idx as usize)
                    .ok_or_else(|| ZrError::format("DEF_STRING references unknown span"))?;
                ctx.resources.def_string(id, String::from_utf8_lossy(bytes).to_string());
            }
            OP_FREE_STRING => {
                let id = read_u32(p, 0).unwrap();
                if !ctx.resources.free_string(id) {
                    return Err(ZrError::format("FREE_STRING on unknown id"));
                }
            }
            OP_DEF_BLOB => {
                let id = read_u32(p, 0).unwrap();
                let span_idx = read_u32(p, 4).unwrap();
                let bytes = view
                    .blob_bytes(span_idx as usize)
                    .ok_or_else(|| ZrError::format("DEF_BLOB references unknown span"))?;
                ctx.resources.def_blob(id, bytes.to_vec());
            }
            OP_FREE_BLOB => {
                let id = read_u32(p, 0).unwrap();
                if !ctx.resources.free_blob(id) {
                    return Err(ZrError::format("FREE_BLOB on unknown id"));
                }
            }
            OP_BLIT_RECT => {
                let sx = read_u32(p, 0).unwrap() as u16;
                let sy = read_u32(p, 4).unwrap() as u16;
                let sw = read_u32(p, 8).unwrap();
                let sh = read_u32(p, 12).unwrap();
                let dx = read_u32(p, 16).unwrap() as u16;
                let dy = read_u32(p, 20).unwrap() as u16;
                if sw == 0 || sh == 0 {
                    return Err(ZrError::invalid_argument("BLIT_RECT zero-dimension rect"));
                }
                let src_rect = Rect::new(sx, sy, sx + sw as u16 - 1, sy + sh as u16 - 1);
                painter.framebuffer_mut().blit_within(dx, dy, src_rect);
            }
            OP_DRAW_CANVAS => {
                let x = read_u32(p, 0).unwrap() as u16;
                let y = read_u32(p, 4).unwrap() as u16;
                let w = read_u32(p, 8).unwrap();
                let h = read_u32(p, 12).unwrap();
                let blob_idx = read_u32(p, 16).unwrap();
                let mode_raw = read_u32(p, 20).unwrap();
                let mode = BlitterMode::from_u32(mode_raw)
                    .ok_or_else(|| ZrError::invalid_argument("unknown blitter mode"))?;
                let resolved = blitter::resolve_auto(
                    mode,
                    ctx.dumb_terminal,
                    ctx.pipe_mode,
                    ctx.supports_sextant,
                    ctx.supports_quadrant,
                );
                let blob = view
                    .blob_bytes(blob_idx as usize)
                    .ok_or_else(|| ZrError::format("DRAW_CANVAS references unknown blob"))?;
                draw_canvas(&mut painter, x, y, w, h, blob, resolved)?;
            }
            OP_DRAW_IMAGE => {
                let x = read_u32(p, 0).unwrap() as u16;
                let y = read_u32(p, 4).unwrap() as u16;
                let w = read_u32(p, 8).unwrap();
                let h = read_u32(p, 12).unwrap();
                let image_id = read_u32(p, 16).unwrap();
                let format = read_u32(p, 20).unwrap();
                let protocol = read_u32(p, 24).unwrap();
                if w == 0 || h == 0 {
                    return Err(ZrError::invalid_argument("DRAW_IMAGE zero-dimension rect"));
                }
                let blob = ctx
                    .resources
                    .get_blob(image_id)
                    .ok_or_else(|| ZrError::format("DRAW_IMAGE references unknown or freed image id"))?;

                if protocol != IMAGE_PROTOCOL_NONE {
                    if ctx.image_staging_cap == 0 {
                        return Err(ZrError::invalid_argument(
                            "DRAW_IMAGE requires a staging buffer when an image protocol is negotiated",
                        ));
                    }
                    if blob.len() > ctx.image_staging_cap {
                        return Err(ZrError::limit("image exceeds staging buffer capacity"));
                    }
                    ctx.image_staging.clear();
                    ctx.image_staging.extend_from_slice(blob);
                } else if format == IMAGE_FORMAT_PNG {
                    return Err(ZrError::unsupported("PNG input without a negotiated image protocol"));
                } else {
                    draw_image_fallback(&mut painter, x, y, w, h, blob)?;
                }
            }
            OP_SET_CURSOR => {
                let x = read_u32(p, 0).unwrap() as u16;
                let y = read_u32(p, 4).unwrap() as u16;
                let shape = read_u32(p, 8).unwrap();
                let visible = read_u32(p, 12).unwrap();
                let blink = read_u32(p, 16).unwrap();
                ctx.cursor.x = x;
                ctx.cursor.y = y;
                ctx.cursor.shape = CursorShape::from_u32(shape);
                ctx.cursor.visible = visible != 0;
                ctx.cursor.blink = blink != 0;
            }
            other => return Err(ZrError::unsupported(format!("unknown opcode {other}"))),
        }
    }

    if clip_depth != 0 {
        return Err(ZrError::format("unbalanced PUSH_CLIP/POP_CLIP"));
    }

    Ok(())
}

/// Writes grapheme clusters left-to-right from `x`, returning the final x.
/// Wide-glyph cursor advance is always the cluster's display width, even
/// when clipping forces a replacement glyph.
fn draw_text_bytes(painter: &mut Painter, x0: u16, y: u16, bytes: &[u8], style: Style, policy: WidthPolicy) -> u16 {
    let (_normalized, segs) = zr_text::segment_bytes(bytes, policy);
    let mut x = x0;
    for seg in segs {
        painter.put_grapheme(x, y, &seg.cluster, seg.width, style);
        x = x.saturating_add(seg.width.max(1));
    }
    x
}

fn draw_canvas(
    painter: &mut Painter,
    x0: u16,
    y0: u16,
    w: u32,
    h: u32,
    blob: &[u8],
    mode: BlitterMode,
) -> ZrResult<()> {
    if w == 0 || h == 0 {
        return Err(ZrError::invalid_argument("DRAW_CANVAS zero-dimension rect"));
    }
    let pixel_count = blob.len() / 4;
    let mut pixels = Vec::with_capacity(pixel_count);
    for chunk in blob.chunks_exact(4) {
        pixels.push(Rgba {
            r: chunk[0],
            g: chunk[1],
            b: chunk[2],
            a: chunk[3],
        });
    }
    if pixels.is_empty() {
        return Ok(());
    }
    let blob_w = (w as usize).max(1);
    let blob_h = pixels.len() / blob_w.max(1);
    for cy in 0..h {
        for cx in 0..w {
            let px = cx as usize;
            let py = cy as usize;
            if px >= blob_w || py >= blob_h {
                continue;
            }
            let (glyph, style) = blitter::lower_block(&pixels, blob_w, px, py, 1, 1, mode)?;
            painter.put_grapheme(x0 + cx as u16, y0 + cy as u16, glyph, 1, style);
        }
    }
    Ok(())
}

/// Per-cell RGBA averaging fallback for `DRAW_IMAGE` when no image protocol
/// is negotiated: identical lowering to `draw_canvas`'s halfblock path,
/// since the wire format gives `DRAW_IMAGE` no blitter-mode choice.
fn draw_image_fallback(painter: &mut Painter, x0: u16, y0: u16, w: u32, h: u32, blob: &[u8]) -> ZrResult<()> {
    let pixel_count = blob.len() / 4;
    let mut pixels = Vec::with_capacity(pixel_count);
    for chunk in blob.chunks_exact(4) {
        pixels.push(Rgba {
            r: chunk[0],
            g: chunk[1],
            b: chunk[2],
            a: chunk[3],
        });
    }
    if pixels.is_empty() {
        return Ok(());
    }
    let blob_w = (w as usize).max(1);
    let blob_h = pixels.len() / blob_w.max(1);
    for cy in 0..h {
        for cx in 0..w {
            let px = cx as usize;
            let py = cy as usize;
            if px >= blob_w || py >= blob_h {
                continue;
            }
            let (glyph, style) = blitter::lower_block(&pixels, blob_w, px, py, 1, 1, BlitterMode::Halfblock)?;
            painter.put_grapheme(x0 + cx as u16, y0 + cy as u16, glyph, 1, style);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DrawlistBuilder;
    use crate::validate::validate;

    fn default_ctx<'a>(
        fb: &'a mut Framebuffer,
        cursor: &'a mut CursorState,
        resources: &'a mut ResourceTables,
        image_staging: &'a mut Vec<u8>,
    ) -> ExecContext<'a> {
        ExecContext {
            fb,
            cursor,
            resources,
            width_policy: WidthPolicy::default(),
            limits: Limits::default(),
            dumb_terminal: false,
            pipe_mode: false,
            supports_sextant: true,
            supports_quadrant: true,
            image_staging,
            image_staging_cap: 1 << 20,
        }
    }

    #[test]
    fn clear_and_draw_text_writes_cells() {
        let mut b = DrawlistBuilder::new();
        let s = b.def_string("X");
        b.clear(0, 0).draw_text(0, 0, s, 1, 0, 0, 0, 0, 0, 0);
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();

        let mut fb = Framebuffer::init(4, 1).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut staging = Vec::new();
        let mut ctx = default_ctx(&mut fb, &mut cursor, &mut resources, &mut staging);
        execute(&view, &mut ctx).unwrap();
        assert_eq!(fb.cell_const(0, 0).unwrap().glyph.as_str(), "X");
    }

    #[test]
    fn exceeding_clip_depth_is_rejected() {
        let mut b = DrawlistBuilder::new();
        for _ in 0..(Limits::default().max_clip_depth + 1) {
            b.push_clip(0, 0, 1, 1);
        }
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();
        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut staging = Vec::new();
        let mut ctx = default_ctx(&mut fb, &mut cursor, &mut resources, &mut staging);
        assert!(execute(&view, &mut ctx).is_err());
    }

    #[test]
    fn set_cursor_updates_state() {
        let mut b = DrawlistBuilder::new();
        b.set_cursor(3, 2, 1, 0, 1);
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();
        let mut fb = Framebuffer::init(10, 10).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut staging = Vec::new();
        let mut ctx = default_ctx(&mut fb, &mut cursor, &mut resources, &mut staging);
        execute(&view, &mut ctx).unwrap();
        assert_eq!(cursor.x, 3);
        assert_eq!(cursor.y, 2);
        assert!(!cursor.visible);
    }

    fn rgba_blob(w: usize, h: usize, pixel: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::with_capacity(w * h * 4);
        for _ in 0..(w * h) {
            out.extend_from_slice(&pixel);
        }
        out
    }

    #[test]
    fn draw_image_falls_back_to_rgba_averaging_without_protocol() {
        let mut b = DrawlistBuilder::new();
        let blob_span = b.def_blob(&rgba_blob(2, 2, [10, 10, 10, 255]));
        b.def_blob_cmd(7, blob_span);
        b.draw_image(0, 0, 2, 2, 7, IMAGE_FORMAT_RGBA8, IMAGE_PROTOCOL_NONE);
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();

        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut staging = Vec::new();
        let mut ctx = default_ctx(&mut fb, &mut cursor, &mut resources, &mut staging);
        execute(&view, &mut ctx).unwrap();
        // Near-black average lowers to a filled block glyph, not a space.
        assert_eq!(fb.cell_const(0, 0).unwrap().glyph.as_str(), "\u{2588}");
    }

    #[test]
    fn draw_image_png_without_protocol_is_unsupported() {
        let mut b = DrawlistBuilder::new();
        let blob_span = b.def_blob(&rgba_blob(1, 1, [0, 0, 0, 255]));
        b.def_blob_cmd(9, blob_span);
        b.draw_image(0, 0, 1, 1, 9, IMAGE_FORMAT_PNG, IMAGE_PROTOCOL_NONE);
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();

        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut staging = Vec::new();
        let mut ctx = default_ctx(&mut fb, &mut cursor, &mut resources, &mut staging);
        let err = execute(&view, &mut ctx).unwrap_err();
        assert!(matches!(err, ZrError::Unsupported(_)));
    }

    #[test]
    fn draw_image_with_protocol_requires_staging_buffer() {
        let mut b = DrawlistBuilder::new();
        let blob_span = b.def_blob(&rgba_blob(1, 1, [0, 0, 0, 255]));
        b.def_blob_cmd(3, blob_span);
        b.draw_image(0, 0, 1, 1, 3, IMAGE_FORMAT_RGBA8, 1);
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();

        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut ctx = ExecContext {
            fb: &mut fb,
            cursor: &mut cursor,
            resources: &mut resources,
            width_policy: WidthPolicy::default(),
            limits: Limits::default(),
            dumb_terminal: false,
            pipe_mode: false,
            supports_sextant: true,
            supports_quadrant: true,
            image_staging: &mut Vec::new(),
            image_staging_cap: 0,
        };
        let err = execute(&view, &mut ctx).unwrap_err();
        assert!(matches!(err, ZrError::InvalidArgument(_)));
    }

    #[test]
    fn draw_image_protocol_path_fills_staging_buffer() {
        let mut b = DrawlistBuilder::new();
        let pixel = rgba_blob(1, 1, [1, 2, 3, 255]);
        let blob_span = b.def_blob(&pixel);
        b.def_blob_cmd(3, blob_span);
        b.draw_image(0, 0, 1, 1, 3, IMAGE_FORMAT_PNG, 1);
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();

        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut staging = Vec::new();
        let mut ctx = default_ctx(&mut fb, &mut cursor, &mut resources, &mut staging);
        execute(&view, &mut ctx).unwrap();
        assert_eq!(staging, pixel);
    }

    #[test]
    fn draw_image_freed_id_is_format_error() {
        let mut b = DrawlistBuilder::new();
        let blob_span = b.def_blob(&rgba_blob(1, 1, [0, 0, 0, 255]));
        b.def_blob_cmd(5, blob_span);
        b.free_blob(5);
        b.draw_image(0, 0, 1, 1, 5, IMAGE_FORMAT_RGBA8, IMAGE_PROTOCOL_NONE);
        let bytes = b.finish();
        let view = validate(&bytes, &Limits::default()).unwrap();

        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut cursor = CursorState::default();
        let mut resources = ResourceTables::new();
        let mut staging = Vec::new();
        let mut ctx = default_ctx(&mut fb, &mut cursor, &mut resources, &mut staging);
        let err = execute(&view, &mut ctx).unwrap_err();
        assert!(matches!(err, ZrError::Format(_)));
    }
}
