//! `Scratch`: persistent row-hash cache the caller owns across frames, so
//! the diff renderer can skip unchanged rows without re-hashing the whole
//! grid every frame. Mirrors the source's line-hash viewport cache, one
//! level up: whole terminal rows instead of buffer lines.

use ahash::AHasher;
use std::hash::{Hash, Hasher};
use zr_cell::{Cell, Framebuffer};

#[derive(Debug, Default)]
pub struct Scratch {
    cols: u16,
    rows: u16,
    row_hashes: Vec<u64>,
    valid: bool,
}

fn hash_row(cells: &[Cell]) -> u64 {
    let mut hasher = AHasher::default();
    for cell in cells {
        cell.glyph.as_str().hash(&mut hasher);
        cell.width.hash(&mut hasher);
        cell.style.fg_rgb.hash(&mut hasher);
        cell.style.bg_rgb.hash(&mut hasher);
        cell.style.attrs.bits().hash(&mut hasher);
        (cell.style.underline_variant as u8).hash(&mut hasher);
        cell.style.underline_rgb.hash(&mut hasher);
        cell.style.link_ref.hash(&mut hasher);
    }
    hasher.finish()
}

impl Scratch {
    pub fn new() -> Scratch {
        Scratch::default()
    }

    /// True once at least one frame has populated `row_hashes` for the
    /// current grid dimensions.
    pub fn is_warm(&self, cols: u16, rows: u16) -> bool {
        self.valid && self.cols == cols && self.rows == rows
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
        self.row_hashes.clear();
    }

    /// Computes this frame's row hashes for `fb`, returning the set of row
    /// indices whose hash changed since the last call (all rows, if cold).
    /// Collisions (hash equal, content different) are the caller's
    /// responsibility to catch via a cell compare; `collision_guard_hits`
    /// in `Stats` counts how often that guard actually fires.
    pub fn diff_rows(&mut self, fb: &Framebuffer) -> Vec<u16> {
        let cols = fb.cols();
        let rows = fb.rows();
        let cold = !self.is_warm(cols, rows);
        let mut changed = Vec::new();
        let mut new_hashes = Vec::with_capacity(rows as usize);
        for y in 0..rows {
            let row: Vec<Cell> = (0..cols)
                .map(|x| *fb.cell_const(x, y).expect("in-bounds cell"))
                .collect();
            let h = hash_row(&row);
            new_hashes.push(h);
            if cold || self.row_hashes.get(y as usize) != Some(&h) {
                changed.push(y);
            }
        }
        self.cols = cols;
        self.rows = rows;
        self.row_hashes = new_hashes;
        self.valid = true;
        changed
    }

    pub fn row_hash(&self, y: u16) -> Option<u64> {
        self.row_hashes.get(y as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zr_cell::Rect;

    #[test]
    fn cold_scratch_marks_all_rows_changed() {
        let fb = Framebuffer::init(4, 3).unwrap();
        let mut scratch = Scratch::new();
        let changed = scratch.diff_rows(&fb);
        assert_eq!(changed, vec![0, 1, 2]);
    }

    #[test]
    fn warm_scratch_detects_only_touched_row() {
        let mut fb = Framebuffer::init(4, 3).unwrap();
        let mut scratch = Scratch::new();
        let _ = scratch.diff_rows(&fb);
        let clip = Rect::full(4, 3);
        fb.put_grapheme_clipped(clip, 1, 1, "Z", 1, Default::default());
        let changed = scratch.diff_rows(&fb);
        assert_eq!(changed, vec![1]);
    }

    #[test]
    fn resize_forces_cold_restart() {
        let fb_a = Framebuffer::init(4, 3).unwrap();
        let fb_b = Framebuffer::init(5, 3).unwrap();
        let mut scratch = Scratch::new();
        let _ = scratch.diff_rows(&fb_a);
        let changed = scratch.diff_rows(&fb_b);
        assert_eq!(changed, vec![0, 1, 2]);
    }
}
