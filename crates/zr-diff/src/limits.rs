//! Tunables for a single `render` call.

#[derive(Debug, Clone, Copy)]
pub struct DiffLimits {
    /// Caller's output buffer capacity. Exceeding it aborts the whole
    /// call with no partial bytes written (§7 no-partial-effects).
    pub max_output_bytes: usize,
}

impl Default for DiffLimits {
    fn default() -> DiffLimits {
        DiffLimits { max_output_bytes: 1 << 20 }
    }
}

/// Proportion of rows that must be dirty before the renderer gives up on
/// row-by-row damage walking and just sweeps the whole grid. Not pinned by
/// any test vector (spec §9 open question); chosen conservatively in the
/// same spirit as the source's `LINES_ESCALATION_THRESHOLD_PCT`.
pub const SWEEP_PATH_THRESHOLD_PCT: f32 = 0.60;

/// Inter-span gap (in unchanged columns) within a dirty row below which
/// the renderer prints through the gap instead of repositioning the
/// cursor. Not pinned by any test vector (spec §9 open question: "any
/// deterministic choice is ok").
pub const SPAN_GAP_TOLERANCE: u16 = 3;
