//! Engine construction-time configuration: arena sizing, limits, and the
//! handful of behavioral switches `create` must validate up front rather
//! than failing lazily on the first `present`/`submit_drawlist`.

use zr_cell::{ZrError, ZrResult};
use zr_drawlist::Limits as DrawlistLimits;
use zr_input::queue::EventQueue;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub cols: u16,
    pub rows: u16,
    pub arena_initial_bytes: usize,
    pub arena_max_total_bytes: usize,
    pub frame_arena_initial_bytes: usize,
    pub frame_arena_max_total_bytes: usize,
    pub event_queue_capacity: usize,
    pub event_queue_max_payload_bytes: usize,
    pub max_output_bytes: usize,
    pub target_fps: u32,
    pub wait_for_output_drain: bool,
    pub allow_scroll_opt: bool,
    /// Not a `PlatformCaps` field (the canvas blitter's block-rendering
    /// fallback ladder is an engine-level render-quality choice, not a
    /// protocol capability the diff renderer observes).
    pub supports_sextant: bool,
    pub supports_quadrant: bool,
    pub emoji_wide: bool,
    /// Capacity of the `DRAW_IMAGE` staging buffer used when a native image
    /// protocol is negotiated. Zero means the engine offers no staging
    /// buffer, so `DRAW_IMAGE` with a non-`NONE` protocol always fails.
    pub image_staging_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            cols: 80,
            rows: 24,
            arena_initial_bytes: 1 << 16,
            arena_max_total_bytes: 1 << 24,
            frame_arena_initial_bytes: 1 << 14,
            frame_arena_max_total_bytes: 1 << 20,
            event_queue_capacity: 256,
            event_queue_max_payload_bytes: 1 << 16,
            max_output_bytes: 1 << 20,
            target_fps: 60,
            wait_for_output_drain: false,
            allow_scroll_opt: true,
            supports_sextant: true,
            supports_quadrant: true,
            emoji_wide: true,
            image_staging_bytes: 1 << 22,
        }
    }
}

impl EngineConfig {
    /// Validates the non-zero / ordering invariants `create` must reject up
    /// front (spec's Limits defaults rule: zero or inverted relationships
    /// are `ERR_INVALID_ARGUMENT`, never a lazily-discovered panic).
    pub fn validate(&self) -> ZrResult<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(ZrError::invalid_argument("cols/rows must be non-zero"));
        }
        if self.arena_initial_bytes == 0 || self.arena_max_total_bytes == 0 {
            return Err(ZrError::invalid_argument("arena byte budgets must be non-zero"));
        }
        if self.arena_initial_bytes > self.arena_max_total_bytes {
            return Err(ZrError::invalid_argument("arena_initial_bytes exceeds arena_max_total_bytes"));
        }
        if self.frame_arena_initial_bytes == 0 || self.frame_arena_max_total_bytes == 0 {
            return Err(ZrError::invalid_argument("frame arena byte budgets must be non-zero"));
        }
        if self.frame_arena_initial_bytes > self.frame_arena_max_total_bytes {
            return Err(ZrError::invalid_argument(
                "frame_arena_initial_bytes exceeds frame_arena_max_total_bytes",
            ));
        }
        if self.event_queue_capacity == 0 {
            return Err(ZrError::invalid_argument("event_queue_capacity must be non-zero"));
        }
        if self.event_queue_max_payload_bytes == 0 {
            return Err(ZrError::invalid_argument("event_queue_max_payload_bytes must be non-zero"));
        }
        if self.max_output_bytes == 0 {
            return Err(ZrError::invalid_argument("max_output_bytes must be non-zero"));
        }
        if self.target_fps == 0 {
            return Err(ZrError::invalid_argument("target_fps must be non-zero"));
        }
        Ok(())
    }

    pub fn drawlist_limits(&self) -> DrawlistLimits {
        DrawlistLimits::default()
    }

    pub fn new_event_queue(&self) -> EventQueue {
        EventQueue::new(self.event_queue_capacity, self.event_queue_max_payload_bytes)
    }

    pub fn width_policy(&self) -> zr_text::WidthPolicy {
        zr_text::WidthPolicy { emoji_wide: self.emoji_wide }
    }
}
