//! Top-level diff renderer: turns two framebuffers plus a shadow terminal
//! state into a single VT/ANSI byte stream, per-cell minimal, honoring the
//! baseline re-establishment, run-splitting, SGR, and hyperlink rules.

use crate::hyperlink::LinkPen;
use crate::limits::{DiffLimits, SPAN_GAP_TOLERANCE, SWEEP_PATH_THRESHOLD_PCT};
use crate::scratch::Scratch;
use crate::sgr::Pen;
use crate::stats::Stats;
use std::collections::HashSet;
use zr_cell::{Cell, Framebuffer, Style, ZrError, ZrResult};
use zr_terminal::{CursorShape, PlatformCaps, TerminalState, ValidFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredCursor {
    pub x: u16,
    pub y: u16,
    pub visible: bool,
    pub shape: CursorShape,
    pub blink: bool,
}

fn cup(x: u16, y: u16) -> Vec<u8> {
    format!("\x1b[{};{}H", y as u32 + 1, x as u32 + 1).into_bytes()
}

fn decscusr(shape: CursorShape, blink: bool) -> Vec<u8> {
    let ps = match (shape, blink) {
        (CursorShape::Block, true) => 1,
        (CursorShape::Block, false) => 2,
        (CursorShape::Underline, true) => 3,
        (CursorShape::Underline, false) => 4,
        (CursorShape::Bar, true) => 5,
        (CursorShape::Bar, false) => 6,
    };
    format!("\x1b[{} q", ps).into_bytes()
}

fn rows_equal(a: &Framebuffer, ay: u16, b: &Framebuffer, by: u16) -> bool {
    for x in 0..a.cols() {
        if a.cell_const(x, ay) != b.cell_const(x, by) {
            return false;
        }
    }
    true
}

/// Tries a pure single-line vertical shift across the whole grid. Returns
/// `Some((is_scroll_up, fresh_row))` on a hit: `fresh_row` is the row index
/// whose content must still be rendered fresh (against a blank reference)
/// after the shift escape is emitted.
fn detect_single_line_shift(prev: &Framebuffer, next: &Framebuffer) -> Option<(bool, u16)> {
    let rows = next.rows();
    if rows < 2 {
        return None;
    }
    let scroll_up = (0..rows - 1).all(|y| rows_equal(next, y, prev, y + 1));
    if scroll_up {
        return Some((true, rows - 1));
    }
    let scroll_down = (1..rows).all(|y| rows_equal(next, y, prev, y - 1));
    if scroll_down {
        return Some((false, 0));
    }
    None
}

enum RowReference<'a> {
    Prev(&'a Framebuffer),
    Blank,
}

impl<'a> RowReference<'a> {
    fn cell(&self, x: u16, y: u16) -> Cell {
        match self {
            RowReference::Prev(fb) => *fb.cell_const(x, y).expect("in-bounds"),
            RowReference::Blank => Cell::blank(),
        }
    }
}

fn dirty_columns(reference: &RowReference, next: &Framebuffer, y: u16) -> Vec<u16> {
    let mut cols = Vec::new();
    for x in 0..next.cols() {
        if reference.cell(x, y) != *next.cell_const(x, y).expect("in-bounds") {
            cols.push(x);
        }
    }
    cols
}

/// Merges raw dirty columns into printable runs, bridging small gaps and
/// never starting a run on an orphaned continuation cell.
fn build_runs(next: &Framebuffer, y: u16, dirty: &[u16]) -> Vec<(u16, u16)> {
    if dirty.is_empty() {
        return Vec::new();
    }
    let mut runs: Vec<(u16, u16)> = Vec::new();
    let mut start = dirty[0];
    let mut end = dirty[0] + 1;
    for &x in &dirty[1..] {
        if x <= end.saturating_add(SPAN_GAP_TOLERANCE) {
            end = x + 1;
        } else {
            runs.push((start, end));
            start = x;
            end = x + 1;
        }
    }
    runs.push((start, end));
    for run in runs.iter_mut() {
        if run.0 > 0 && next.cell_const(run.0, y).map(|c| c.is_continuation()).unwrap_or(false) {
            run.0 -= 1;
        }
    }
    runs
}

/// Renders the diff between `prev` and `next` (same dimensions) into `out`,
/// updating `state` to reflect what the real terminal now shows. On
/// `Err`, neither `out` nor `state` nor `scratch` observe any partial
/// effect — callers may retry after simplifying the frame.
pub fn render(
    prev: &Framebuffer,
    next: &Framebuffer,
    caps: &PlatformCaps,
    state: &mut TerminalState,
    desired_cursor: Option<DesiredCursor>,
    limits: &DiffLimits,
    scratch: &mut Scratch,
    allow_scroll_opt: bool,
    out: &mut [u8],
) -> ZrResult<(usize, Stats)> {
    if prev.cols() != next.cols() || prev.rows() != next.rows() {
        return Err(ZrError::invalid_argument("prev/next framebuffer dimensions differ"));
    }

    let mut working = *state;
    let mut buf: Vec<u8> = Vec::new();
    let mut stats = Stats::default();

    let mut screen_reset = false;
    if !working.is_valid(ValidFields::SCREEN) {
        buf.extend_from_slice(b"\x1b[r");
        let reset_style = Style::default();
        buf.extend(Pen::absolute(&reset_style, caps));
        buf.extend_from_slice(b"\x1b[2J");
        working.mark_valid(ValidFields::SCREEN);
        working.mark_valid(ValidFields::STYLE);
        working.style = reset_style;
        screen_reset = true;
    }

    let mut pen = if working.is_valid(ValidFields::STYLE) {
        Pen::new(working.style)
    } else {
        Pen::new_unknown()
    };

    let mut link_pen = LinkPen::new();
    if !screen_reset && working.is_valid(ValidFields::STYLE) && working.style.link_ref != 0 {
        if let Some(rec) = prev.link_lookup(working.style.link_ref) {
            link_pen.seed(rec.uri.clone(), rec.id.clone());
        }
    }

    let mut cursor_known = working.is_valid(ValidFields::CURSOR_POS);
    let mut cursor_x = working.cursor_x;
    let mut cursor_y = working.cursor_y;

    let rows = next.rows();

    // Ground-truth dirty row set (always correct, independent of hashing).
    let mut dirty_rows: Vec<u16> = Vec::new();
    for y in 0..rows {
        if !rows_equal(prev, y, next, y) {
            dirty_rows.push(y);
        }
    }
    stats.rows_scanned = rows as u32;

    let sweep_threshold = ((rows as f32) * SWEEP_PATH_THRESHOLD_PCT).ceil() as usize;
    stats.path_is_sweep = rows > 0 && dirty_rows.len() >= sweep_threshold.max(1);
    let ground_truth_dirty_rows = dirty_rows.clone();

    let mut scroll_fresh_row: Option<(bool, u16)> = None;
    if allow_scroll_opt && caps.supports_scroll_region && !dirty_rows.is_empty() {
        stats.scroll_opt_attempted = 1;
        if let Some((is_up, fresh)) = detect_single_line_shift(prev, next) {
            stats.scroll_opt_hit = 1;
            buf.extend_from_slice(format!("\x1b[1;{}r", rows).into_bytes().as_slice());
            if is_up {
                buf.extend_from_slice(b"\x1b[1S");
            } else {
                buf.extend_from_slice(b"\x1b[1T");
            }
            cursor_known = false;
            scroll_fresh_row = Some((is_up, fresh));
            dirty_rows = vec![fresh];
        }
    }

    for &y in &dirty_rows {
        let reference = match scroll_fresh_row {
            Some((_, fresh_row)) if fresh_row == y => RowReference::Blank,
            _ => RowReference::Prev(prev),
        };
        let dirty = dirty_columns(&reference, next, y);
        if dirty.is_empty() {
            continue;
        }
        let runs = build_runs(next, y, &dirty);
        stats.rows_emitted += 1;
        for (start, end) in runs {
            if !cursor_known || cursor_x != start || cursor_y != y {
                buf.extend(cup(start, y));
                cursor_known = true;
            }
            let mut x = start;
            while x < end {
                let cell = next.cell_const(x, y).expect("in-bounds");
                if cell.is_continuation() {
                    x += 1;
                    continue;
                }
                buf.extend(pen.transition(&cell.style, caps));
                buf.extend(link_pen.transition(cell.style.link_ref, next.links(), caps.supports_hyperlinks));
                buf.extend_from_slice(cell.glyph.as_str().as_bytes());
                let advance = cell.width.max(1) as u16;
                x += advance;
                cursor_x = x;
                cursor_y = y;
            }
        }
    }

    // Close any still-open hyperlink before touching cursor state, so a
    // trailing OSC 8 never straddles the frame boundary.
    buf.extend(link_pen.close());

    if let Some(desired) = desired_cursor {
        if !cursor_known || cursor_x != desired.x || cursor_y != desired.y {
            buf.extend(cup(desired.x, desired.y));
            cursor_x = desired.x;
            cursor_y = desired.y;
            cursor_known = true;
        }
        let shape_known = working.is_valid(ValidFields::CURSOR_SHAPE);
        if desired.visible && (!shape_known || working.cursor_shape != desired.shape || working.cursor_blink != desired.blink)
            && caps.supports_cursor_shape
        {
            buf.extend(decscusr(desired.shape, desired.blink));
        }
        let vis_known = working.is_valid(ValidFields::CURSOR_VIS);
        if !vis_known || working.cursor_visible != desired.visible {
            buf.extend_from_slice(if desired.visible { b"\x1b[?25h" } else { b"\x1b[?25l" });
        }
        working.cursor_visible = desired.visible;
        working.cursor_shape = desired.shape;
        working.cursor_blink = desired.blink;
        working.mark_valid(ValidFields::CURSOR_VIS);
        working.mark_valid(ValidFields::CURSOR_SHAPE);
    }

    if buf.len() > limits.max_output_bytes || buf.len() > out.len() {
        return Err(ZrError::limit("diff output exceeds caller's output buffer"));
    }

    // Row-hash acceleration is used for telemetry only; ground truth above
    // is always authoritative, so a hash collision can never cause a missed
    // update, only an extra (harmless) hash-miss count. Computed only once
    // the frame is known to fit, so a rejected frame leaves `scratch`
    // untouched.
    let hash_changed: HashSet<u16> = scratch.diff_rows(next).into_iter().collect();
    for &y in &ground_truth_dirty_rows {
        if !hash_changed.contains(&y) {
            stats.collision_guard_hits += 1;
        }
    }

    working.cursor_x = cursor_x;
    working.cursor_y = cursor_y;
    if cursor_known {
        working.mark_valid(ValidFields::CURSOR_POS);
    }
    if pen.is_known() {
        working.style = pen.current();
        working.mark_valid(ValidFields::STYLE);
    }

    out[..buf.len()].copy_from_slice(&buf);
    stats.bytes_written = buf.len() as u32;
    *state = working;
    Ok((buf.len(), stats))
}
