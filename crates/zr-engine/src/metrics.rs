//! ABI-stable, append-only metrics snapshot. Counters live on `Engine`
//! directly (single-threaded per the concurrency model, so no atomics are
//! needed); `snapshot()` copies them out into the struct callers can
//! partially serialize via `copy_prefix_into`.
//!
//! Append-only: a new field goes on the end of both the struct and
//! `to_le_fields`. Never reorder or remove a field — that would change
//! what a caller's `struct_size` prefix observes from one build to the
//! next.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub drawlists_submitted: u64,
    pub drawlists_rejected: u64,
    pub frames_presented: u64,
    pub frames_rejected_limit: u64,
    pub bytes_written_total: u64,
    pub rows_scanned_total: u64,
    pub rows_emitted_total: u64,
    pub scroll_opt_hits: u64,
    pub sweep_path_frames: u64,
    pub events_dropped_due_to_full: u64,
    pub ticks_synthesized: u64,
}

impl MetricsSnapshot {
    fn to_le_fields(&self) -> [u64; 11] {
        [
            self.drawlists_submitted,
            self.drawlists_rejected,
            self.frames_presented,
            self.frames_rejected_limit,
            self.bytes_written_total,
            self.rows_scanned_total,
            self.rows_emitted_total,
            self.scroll_opt_hits,
            self.sweep_path_frames,
            self.events_dropped_due_to_full,
            self.ticks_synthesized,
        ]
    }

    /// Copies `min(struct_size, size_of::<MetricsSnapshot>())` bytes of
    /// this snapshot, serialized field-by-field little-endian in
    /// declaration order, into `out`. Never writes past `out.len()`.
    pub fn copy_prefix_into(&self, out: &mut [u8]) -> usize {
        let mut bytes = Vec::with_capacity(self.to_le_fields().len() * 8);
        for field in self.to_le_fields() {
            bytes.extend_from_slice(&field.to_le_bytes());
        }
        let n = bytes.len().min(out.len());
        out[..n].copy_from_slice(&bytes[..n]);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_copy_never_exceeds_requested_size() {
        let snap = MetricsSnapshot { drawlists_submitted: 7, frames_presented: 3, ..Default::default() };
        let mut out = [0xAAu8; 10];
        let n = snap.copy_prefix_into(&mut out);
        assert_eq!(n, 10);
        assert_eq!(&out[..8], &7u64.to_le_bytes());
    }

    #[test]
    fn prefix_copy_into_oversized_buffer_stops_at_struct_len() {
        let snap = MetricsSnapshot::default();
        let mut out = [0xAAu8; 4096];
        let n = snap.copy_prefix_into(&mut out);
        assert_eq!(n, 11 * 8);
        assert!(out[n..].iter().all(|&b| b == 0xAA));
    }
}
