//! Per-call diagnostics returned alongside the rendered bytes. Distinct
//! from a persistent metrics counter: `Stats` is produced fresh by each
//! `render` call so callers can log or assert on a single frame's choices.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    Damage,
    Sweep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub path_is_sweep: bool,
    pub rows_scanned: u32,
    pub rows_emitted: u32,
    pub collision_guard_hits: u32,
    pub scroll_opt_attempted: u32,
    pub scroll_opt_hit: u32,
    pub bytes_written: u32,
}

impl Stats {
    pub fn path(&self) -> RenderPath {
        if self.path_is_sweep {
            RenderPath::Sweep
        } else {
            RenderPath::Damage
        }
    }
}
