//! Zero-copy validation of a versioned binary drawlist into a read-only
//! `View`. Never mutates `buf`; any violation of the rules below yields a
//! typed error instead of a partially-built view.

use crate::format::*;
use crate::view::{read_u16, read_u32, CmdHeader, CmdRef, Header, StringSpan, View};
use zr_cell::{ZrError, ZrResult};

fn aligned(offset: u32) -> bool {
    offset % ALIGN as u32 == 0
}

struct Region {
    start: u64,
    end: u64,
}

fn regions_overlap(a: &Region, b: &Region) -> bool {
    a.start < b.end && b.start < a.end
}

pub fn validate<'a>(buf: &'a [u8], limits: &Limits) -> ZrResult<View<'a>> {
    let header = Header::parse(buf).ok_or_else(|| ZrError::format("buffer shorter than header"))?;

    if header.magic != MAGIC {
        return Err(ZrError::format("bad magic"));
    }
    if header.version == 0 || header.version > CURRENT_VERSION {
        return Err(ZrError::unsupported(format!(
            "drawlist version {} unsupported",
            header.version
        )));
    }
    if header.header_size as usize != HEADER_SIZE {
        return Err(ZrError::format("unexpected header_size"));
    }
    if header.total_size < header.header_size {
        return Err(ZrError::format("total_size smaller than header_size"));
    }
    if header.total_size > limits.max_total_bytes {
        return Err(ZrError::limit("total_size exceeds max_total_bytes"));
    }
    if header.total_size as usize > buf.len() {
        return Err(ZrError::format("total_size exceeds buffer length"));
    }

    for off in [
        header.cmd_offset,
        header.strings_span_offset,
        header.strings_bytes_offset,
        header.blobs_span_offset,
        header.blobs_bytes_offset,
    ] {
        if !aligned(off) {
            return Err(ZrError::format("section offset not 4-byte aligned"));
        }
    }

    // Empty-table rule.
    if header.cmd_count == 0 && (header.cmd_offset != 0 || header.cmd_bytes != 0) {
        return Err(ZrError::format("empty cmd table must have zero offset/len"));
    }
    if header.strings_count == 0
        && (header.strings_span_offset != 0
            || header.strings_bytes_offset != 0
            || header.strings_bytes_len != 0)
    {
        return Err(ZrError::format("empty strings table must have zero offset/len"));
    }
    if header.blobs_count == 0
        && (header.blobs_span_offset != 0
            || header.blobs_bytes_offset != 0
            || header.blobs_bytes_len != 0)
    {
        return Err(ZrError::format("empty blobs table must have zero offset/len"));
    }

    if header.cmd_count > limits.max_cmds {
        return Err(ZrError::limit("cmd_count exceeds max_cmds"));
    }
    if header.strings_count > limits.max_strings {
        return Err(ZrError::limit("strings_count exceeds max_strings"));
    }
    if header.blobs_count > limits.max_blobs {
        return Err(ZrError::limit("blobs_count exceeds max_blobs"));
    }

    let total = header.total_size as u64;
    let contain = |start: u32, len: u64| -> ZrResult<()> {
        let end = start as u64 + len;
        if end > total {
            return Err(ZrError::format("section not contained within total_size"));
        }
        Ok(())
    };
    contain(header.cmd_offset, header.cmd_bytes as u64)?;
    contain(header.strings_span_offset, header.strings_count as u64 * 8)?;
    contain(header.strings_bytes_offset, header.strings_bytes_len as u64)?;
    contain(header.blobs_span_offset, header.blobs_count as u64 * 8)?;
    contain(header.blobs_bytes_offset, header.blobs_bytes_len as u64)?;

    let regions = [
        Region { start: 0, end: header.header_size as u64 },
        Region { start: header.cmd_offset as u64, end: header.cmd_offset as u64 + header.cmd_bytes as u64 },
        Region { start: header.strings_span_offset as u64, end: header.strings_span_offset as u64 + header.strings_count as u64 * 8 },
        Region { start: header.strings_bytes_offset as u64, end: header.strings_bytes_offset as u64 + header.strings_bytes_len as u64 },
        Region { start: header.blobs_span_offset as u64, end: header.blobs_span_offset as u64 + header.blobs_count as u64 * 8 },
        Region { start: header.blobs_bytes_offset as u64, end: header.blobs_bytes_offset as u64 + header.blobs_bytes_len as u64 },
    ];
    for i in 0..regions.len() {
        for j in (i + 1)..regions.len() {
            let a = &regions[i];
            let b = &regions[j];
            if a.start == a.end || b.start == b.end {
                continue; // empty regions never overlap
            }
            if regions_overlap(a, b) {
                return Err(ZrError::format("sections overlap"));
            }
        }
    }

    // --- string spans ---
    let mut string_spans = Vec::with_capacity(header.strings_count as usize);
    for i in 0..header.strings_count {
        let off = header.strings_span_offset as usize + i as usize * 8;
        let s_off = read_u32(buf, off).ok_or_else(|| ZrError::format("truncated string span table"))?;
        let s_len = read_u32(buf, off + 4).ok_or_else(|| ZrError::format("truncated string span table"))?;
        if s_off as u64 + s_len as u64 > header.strings_bytes_len as u64 {
            return Err(ZrError::format("string span out of bounds"));
        }
        string_spans.push(StringSpan { offset: s_off, len: s_len });
    }

    // --- blob spans ---
    let mut blob_spans = Vec::with_capacity(header.blobs_count as usize);
    for i in 0..header.blobs_count {
        let off = header.blobs_span_offset as usize + i as usize * 8;
        let b_off = read_u32(buf, off).ok_or_else(|| ZrError::format("truncated blob span table"))?;
        let b_len = read_u32(buf, off + 4).ok_or_else(|| ZrError::format("truncated blob span table"))?;
        if b_off as u64 + b_len as u64 > header.blobs_bytes_len as u64 {
            return Err(ZrError::format("blob span out of bounds"));
        }
        blob_spans.push(StringSpan { offset: b_off, len: b_len });
    }

    // --- cmd stream ---
    let cmd_region_end = header.cmd_offset as usize + header.cmd_bytes as usize;
    let mut cursor = header.cmd_offset as usize;
    let mut cmds = Vec::new();
    while cursor < cmd_region_end {
        if cmds.len() as u32 >= limits.max_cmds {
            return Err(ZrError::limit("cmd_count exceeds max_cmds"));
        }
        let opcode = read_u16(buf, cursor).ok_or_else(|| ZrError::format("truncated cmd header"))?;
        let flags = read_u16(buf, cursor + 2).ok_or_else(|| ZrError::format("truncated cmd header"))?;
        let size = read_u32(buf, cursor + 4).ok_or_else(|| ZrError::format("truncated cmd header"))?;

        if size as usize % ALIGN != 0 || (size as usize) < CMD_HEADER_SIZE {
            return Err(ZrError::format("cmd size misaligned or too small"));
        }
        if cursor + size as usize > cmd_region_end {
            return Err(ZrError::format("cmd exceeds cmd region"));
        }

        let payload_offset = cursor + CMD_HEADER_SIZE;
        let payload_len = size as usize - CMD_HEADER_SIZE;

        validate_opcode_payload(opcode, payload_len, buf, payload_offset, limits, &string_spans, &blob_spans)?;

        cmds.push(CmdRef {
            header: CmdHeader { opcode, flags, size },
            payload_offset,
            payload_len,
        });

        cursor += size as usize;
    }
    if cursor != cmd_region_end {
        return Err(ZrError::format("cmd stream does not exactly fill cmd region"));
    }
    if cmds.len() as u32 != header.cmd_count {
        return Err(ZrError::format("cmd_count does not match actual command count"));
    }

    Ok(View {
        buf,
        header,
        cmds,
        string_spans,
        blob_spans,
    })
}

fn validate_opcode_payload(
    opcode: u16,
    payload_len: usize,
    buf: &[u8],
    payload_offset: usize,
    limits: &Limits,
    string_spans: &[StringSpan],
    blob_spans: &[StringSpan],
) -> ZrResult<()> {
    use crate::format::*;
    let fixed = |expected: usize| -> ZrResult<()> {
        if payload_len != expected {
            return Err(ZrError::format("unexpected payload size for opcode"));
        }
        Ok(())
    };
    match opcode {
        OP_CLEAR => fixed(PAYLOAD_CLEAR),
        OP_PUSH_CLIP => fixed(PAYLOAD_PUSH_CLIP),
        OP_POP_CLIP => fixed(PAYLOAD_POP_CLIP),
        OP_FILL_RECT => fixed(PAYLOAD_FILL_RECT),
        OP_DRAW_TEXT => {
            if payload_len != PAYLOAD_DRAW_TEXT && payload_len != PAYLOAD_DRAW_TEXT_EXT {
                return Err(ZrError::format("unexpected DRAW_TEXT payload size"));
            }
            let string_idx = read_u32(buf, payload_offset + 8).ok_or_else(|| ZrError::format("truncated DRAW_TEXT"))?;
            if string_spans.get(string_idx as usize).is_none() {
                return Err(ZrError::format("DRAW_TEXT references unknown string"));
            }
            Ok(())
        }
        OP_DRAW_TEXT_RUN => {
            if payload_len < TEXT_RUN_HEADER {
                return Err(ZrError::format("truncated DRAW_TEXT_RUN header"));
            }
            let segment_count =
                read_u32(buf, payload_offset + 8).ok_or_else(|| ZrError::format("truncated DRAW_TEXT_RUN"))?;
            if segment_count > limits.max_text_run_segments {
                return Err(ZrError::limit("DRAW_TEXT_RUN segment_count exceeds max_text_run_segments"));
            }
            let expected = TEXT_RUN_HEADER + segment_count as usize * TEXT_RUN_SEGMENT_SIZE;
            if payload_len != expected {
                return Err(ZrError::format("DRAW_TEXT_RUN payload size mismatch"));
            }
            for i in 0..segment_count {
                let seg_off = payload_offset + TEXT_RUN_HEADER + i as usize * TEXT_RUN_SEGMENT_SIZE;
                let string_idx = read_u32(buf, seg_off).ok_or_else(|| ZrError::format("truncated segment"))?;
                if string_spans.get(string_idx as usize).is_none() {
                    return Err(ZrError::format("DRAW_TEXT_RUN segment references unknown string"));
                }
            }
            Ok(())
        }
        OP_DEF_STRING => {
            fixed(PAYLOAD_DEF_STRING)?;
            let span_idx = read_u32(buf, payload_offset + 4).ok_or_else(|| ZrError::format("truncated DEF_STRING"))?;
            if string_spans.get(span_idx as usize).is_none() {
                return Err(ZrError::format("DEF_STRING references unknown span"));
            }
            Ok(())
        }
        OP_FREE_STRING => fixed(PAYLOAD_FREE_STRING),
        OP_DEF_BLOB => {
            fixed(PAYLOAD_DEF_BLOB)?;
            let span_idx = read_u32(buf, payload_offset + 4).ok_or_else(|| ZrError::format("truncated DEF_BLOB"))?;
            if blob_spans.get(span_idx as usize).is_none() {
                return Err(ZrError::format("DEF_BLOB references unknown span"));
            }
            Ok(())
        }
        OP_FREE_BLOB => fixed(PAYLOAD_FREE_BLOB),
        OP_BLIT_RECT => fixed(PAYLOAD_BLIT_RECT),
        OP_DRAW_CANVAS => fixed(PAYLOAD_DRAW_CANVAS),
        OP_DRAW_IMAGE => fixed(PAYLOAD_DRAW_IMAGE),
        OP_SET_CURSOR => fixed(PAYLOAD_SET_CURSOR),
        _ => Err(ZrError::unsupported(format!("unknown opcode {opcode}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DrawlistBuilder;

    #[test]
    fn validation_is_pure_leaves_bytes_untouched() {
        let mut b = DrawlistBuilder::new();
        b.clear(0, 0);
        let bytes = b.finish();
        let before = bytes.clone();
        let _ = validate(&bytes, &Limits::default());
        assert_eq!(bytes, before);
    }

    #[test]
    fn bad_magic_is_format_error() {
        let mut b = DrawlistBuilder::new();
        b.clear(0, 0);
        let mut bytes = b.finish();
        bytes[0] ^= 0xFF;
        let err = validate(&bytes, &Limits::default()).unwrap_err();
        assert_eq!(err, ZrError::format("bad magic"));
    }

    #[test]
    fn future_version_is_unsupported() {
        let mut b = DrawlistBuilder::new();
        b.clear(0, 0);
        let mut bytes = b.finish();
        bytes[4..8].copy_from_slice(&(CURRENT_VERSION + 1).to_le_bytes());
        let err = validate(&bytes, &Limits::default()).unwrap_err();
        assert!(matches!(err, ZrError::Unsupported(_)));
    }

    #[test]
    fn overlapping_sections_are_rejected() {
        let mut b = DrawlistBuilder::new();
        b.def_string("hello");
        let mut bytes = b.finish();
        let header = Header::parse(&bytes).unwrap();
        // Point strings_span_offset inside the cmd stream.
        let patched = header.cmd_offset;
        bytes[28..32].copy_from_slice(&patched.to_le_bytes());
        let err = validate(&bytes, &Limits::default()).unwrap_err();
        assert!(matches!(err, ZrError::Format(_)));
    }

    #[test]
    fn unknown_opcode_is_unsupported() {
        let mut b = DrawlistBuilder::new();
        b.clear(0, 0);
        let mut bytes = b.finish();
        let header = Header::parse(&bytes).unwrap();
        let cmd_off = header.cmd_offset as usize;
        bytes[cmd_off..cmd_off + 2].copy_from_slice(&9999u16.to_le_bytes());
        let err = validate(&bytes, &Limits::default()).unwrap_err();
        assert!(matches!(err, ZrError::Unsupported(_)));
    }
}
