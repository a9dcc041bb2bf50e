//! The next-frame cell grid: a contiguous row-major buffer of `Cell`s plus
//! its interned link table.

use crate::cell::Cell;
use crate::error::{ZrError, ZrResult};
use crate::link::LinkTable;
use crate::rect::Rect;
use crate::style::Style;
use std::collections::HashSet;

/// Absurd-dimension guard: past this, cols*rows * size_of::<Cell>() risks
/// overflowing practical arena budgets long before it overflows `usize`.
const MAX_DIM: u32 = 1 << 20;

#[derive(Debug, Clone)]
pub struct Framebuffer {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    links: LinkTable,
}

impl Framebuffer {
    pub fn init(cols: u16, rows: u16) -> ZrResult<Framebuffer> {
        validate_dims(cols, rows)?;
        let count = cols as usize * rows as usize;
        Ok(Framebuffer {
            cols,
            rows,
            cells: vec![Cell::blank(); count],
            links: LinkTable::new(),
        })
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn full_rect(&self) -> Rect {
        Rect::full(self.cols, self.rows)
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.cols && y < self.rows {
            Some(y as usize * self.cols as usize + x as usize)
        } else {
            None
        }
    }

    /// Resize in place. No partial effects: the replacement grid is built
    /// fully before the old one is discarded, so a failure leaves `self`
    /// untouched.
    pub fn resize(&mut self, cols: u16, rows: u16) -> ZrResult<()> {
        validate_dims(cols, rows)?;
        let count = cols as usize * rows as usize;
        let new_cells = vec![Cell::blank(); count];
        self.cols = cols;
        self.rows = rows;
        self.cells = new_cells;
        self.links = LinkTable::new();
        Ok(())
    }

    pub fn clear(&mut self, style: Style) {
        for c in &mut self.cells {
            *c = Cell::blank_styled(style);
        }
    }

    pub fn cell(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        let idx = self.index(x, y)?;
        Some(&mut self.cells[idx])
    }

    pub fn cell_const(&self, x: u16, y: u16) -> Option<&Cell> {
        let idx = self.index(x, y)?;
        Some(&self.cells[idx])
    }

    /// Interns (uri, id) and immediately compacts the link table so peak
    /// size stays bounded by `cells_live + 1`: the returned ref is kept
    /// alive through compaction even though the caller hasn't attached it
    /// to a cell yet.
    pub fn link_intern(&mut self, uri: &str, id: &str) -> ZrResult<u32> {
        let link_ref = self.links.intern(uri, id)?;
        Ok(self.compact_links_keeping(link_ref))
    }

    pub fn link_lookup(&self, link_ref: u32) -> Option<&crate::link::LinkRecord> {
        self.links.lookup(link_ref)
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Drop link-table entries no cell references any more.
    pub fn compact_links(&mut self) {
        self.compact_links_keeping(0);
    }

    /// Compacts against cells currently live plus `keep` (0 means none),
    /// returning `keep`'s post-compaction ref (or 0 if `keep` was 0).
    fn compact_links_keeping(&mut self, keep: u32) -> u32 {
        let mut reachable = HashSet::new();
        for c in &self.cells {
            if c.style.link_ref != 0 {
                reachable.insert(c.style.link_ref);
            }
        }
        if keep != 0 {
            reachable.insert(keep);
        }
        let remap = self.links.compact(&reachable);
        for c in &mut self.cells {
            if c.style.link_ref != 0 {
                if let Some(&new_ref) = remap.get(&c.style.link_ref) {
                    c.style.link_ref = new_ref;
                } else {
                    c.style.link_ref = 0;
                }
            }
        }
        if keep == 0 {
            0
        } else {
            *remap.get(&keep).unwrap_or(&keep)
        }
    }

    /// Write one already-segmented grapheme cluster at (x, y). `width` is
    /// the cluster's display width (0, 1, or 2). Clipping is the caller's
    /// responsibility via `Painter`; this writes unconditionally within
    /// framebuffer bounds, enforcing the wide-glyph invariants.
    pub fn put_grapheme_clipped(
        &mut self,
        clip: Rect,
        x: u16,
        y: u16,
        cluster: &str,
        width: u16,
        style: Style,
    ) {
        if !clip.contains(x, y) || y >= self.rows || x >= self.cols {
            return;
        }
        if width == 2 {
            let continuation_ok =
                x + 1 < self.cols && clip.contains(x + 1, y);
            if !continuation_ok {
                if let Some(idx) = self.index(x, y) {
                    self.cells[idx] = Cell::replacement(style);
                }
                return;
            }
            let lead_idx = self.index(x, y).unwrap();
            let cont_idx = self.index(x + 1, y).unwrap();
            match crate::glyph::GlyphBuf::try_from_str(cluster) {
                Some(g) => {
                    self.cells[lead_idx] = Cell {
                        glyph: g,
                        width: 2,
                        style,
                    };
                    self.cells[cont_idx] = Cell::continuation(style);
                }
                None => {
                    self.cells[lead_idx] = Cell::replacement(style);
                }
            }
        } else {
            let idx = self.index(x, y).unwrap();
            match crate::glyph::GlyphBuf::try_from_str(cluster) {
                Some(g) => {
                    let _ = width;
                    self.cells[idx] = Cell {
                        glyph: g,
                        width: 1,
                        style,
                    };
                }
                None => {
                    self.cells[idx] = Cell::replacement(style);
                }
            }
        }
    }

    pub fn fill_rect(&mut self, clip: Rect, rect: Rect, style: Style) {
        let Some(area) = clip.intersect(&rect) else {
            return;
        };
        for y in area.y0..=area.y1 {
            for x in area.x0..=area.x1 {
                self.put_grapheme_clipped(clip, x, y, " ", 1, style);
            }
        }
    }

    pub fn hline(&mut self, clip: Rect, x: u16, y: u16, len: u16, ch: &str, style: Style) {
        for i in 0..len {
            self.put_grapheme_clipped(clip, x + i, y, ch, 1, style);
        }
    }

    pub fn vline(&mut self, clip: Rect, x: u16, y: u16, len: u16, ch: &str, style: Style) {
        for i in 0..len {
            self.put_grapheme_clipped(clip, x, y + i, ch, 1, style);
        }
    }

    pub fn draw_box(&mut self, clip: Rect, rect: Rect, style: Style) {
        self.hline(clip, rect.x0, rect.y0, rect.width() as u16, "─", style);
        self.hline(clip, rect.x0, rect.y1, rect.width() as u16, "─", style);
        self.vline(clip, rect.x0, rect.y0, rect.height() as u16, "│", style);
        self.vline(clip, rect.x1, rect.y0, rect.height() as u16, "│", style);
        self.put_grapheme_clipped(clip, rect.x0, rect.y0, "┌", 1, style);
        self.put_grapheme_clipped(clip, rect.x1, rect.y0, "┐", 1, style);
        self.put_grapheme_clipped(clip, rect.x0, rect.y1, "└", 1, style);
        self.put_grapheme_clipped(clip, rect.x1, rect.y1, "┘", 1, style);
    }

    /// Vertical scrollbar: `thumb_y0..=thumb_y1` painted with `thumb` glyph,
    /// the rest of the track with `track`.
    pub fn scrollbar_v(
        &mut self,
        clip: Rect,
        x: u16,
        y0: u16,
        y1: u16,
        thumb_y0: u16,
        thumb_y1: u16,
        track: &str,
        thumb: &str,
        style: Style,
    ) {
        for y in y0..=y1 {
            let glyph = if y >= thumb_y0 && y <= thumb_y1 {
                thumb
            } else {
                track
            };
            self.put_grapheme_clipped(clip, x, y, glyph, 1, style);
        }
    }

    /// Copy `src_rect` of `src` into the rectangle at `(dst_x, dst_y)` of
    /// `self`. `src` is read in full before any cell of `self` is written
    /// (rows are snapshotted up front), so the result matches memmove
    /// semantics for any overlap a caller constructs by passing a snapshot
    /// of `self` as `src` — see `blit_within` for the common in-place case.
    /// The destination link_ref is re-interned into `self`'s link table
    /// whenever it differs from `src`'s (always, when the two are distinct
    /// objects; a no-op by content-addressed equality otherwise).
    pub fn blit_rect(&mut self, dst_x: u16, dst_y: u16, src: &Framebuffer, src_rect: Rect) {
        let w = src_rect.width();
        let h = src_rect.height();
        if w == 0 || h == 0 {
            return;
        }

        let rows: Vec<Vec<Cell>> = (0..h)
            .map(|dy| {
                let sy = src_rect.y0 + dy as u16;
                (0..w)
                    .map(|dx| {
                        let sx = src_rect.x0 + dx as u16;
                        src.cell_const(sx, sy).copied().unwrap_or_else(Cell::blank)
                    })
                    .collect()
            })
            .collect();

        for (dy, row) in rows.into_iter().enumerate() {
            let ty = dst_y + dy as u16;
            if ty >= self.rows {
                continue;
            }
            for (dx, mut cell) in row.into_iter().enumerate() {
                let tx = dst_x + dx as u16;
                if tx >= self.cols {
                    continue;
                }
                if cell.style.link_ref != 0 {
                    if let Some(rec) = src.link_lookup(cell.style.link_ref) {
                        let uri = rec.uri.clone();
                        let id = rec.id.clone();
                        cell.style.link_ref = self.link_intern(&uri, &id).unwrap_or(0);
                    }
                }
                let idx = self.index(tx, ty).unwrap();
                self.cells[idx] = cell;
            }
        }
    }

    /// Blit a rectangle to a new position within this same framebuffer.
    /// Snapshots the whole buffer first so overlapping source/destination
    /// rectangles behave like memmove rather than corrupting in place.
    pub fn blit_within(&mut self, dst_x: u16, dst_y: u16, src_rect: Rect) {
        let snapshot = self.clone();
        self.blit_rect(dst_x, dst_y, &snapshot, src_rect);
    }
}

fn validate_dims(cols: u16, rows: u16) -> ZrResult<()> {
    if cols == 0 || rows == 0 {
        return Err(ZrError::invalid_argument("framebuffer dims must be non-zero"));
    }
    if cols as u32 > MAX_DIM || rows as u32 > MAX_DIM {
        return Err(ZrError::limit("framebuffer dims exceed MAX_DIM"));
    }
    Ok(())
}
