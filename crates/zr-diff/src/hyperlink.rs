//! OSC 8 hyperlink transitions: tracks the pen's current link and emits
//! open/close sequences only when the link's *content* (uri, id) changes,
//! not merely its table index.

use zr_cell::LinkTable;

#[derive(Debug, Clone, Default)]
pub struct LinkPen {
    current: Option<(String, String)>,
}

impl LinkPen {
    pub fn new() -> LinkPen {
        LinkPen { current: None }
    }

    /// Seeds the pen's believed-open link without emitting bytes, for
    /// resuming a shadow state carried over from a prior frame.
    pub fn seed(&mut self, uri: String, id: String) {
        self.current = Some((uri, id));
    }

    /// Computes the bytes needed to move the pen's open link to
    /// `target_ref` (0 = no link), resolved against `links`. Capability-
    /// gated: when hyperlinks aren't supported the pen's notion of "open"
    /// never changes, so no OSC 8 is ever emitted, but cell content still
    /// reflects the split boundaries a link would otherwise cause.
    pub fn transition(&mut self, target_ref: u32, links: &LinkTable, supports_hyperlinks: bool) -> Vec<u8> {
        if !supports_hyperlinks {
            return Vec::new();
        }
        let target = if target_ref == 0 {
            None
        } else {
            links.lookup(target_ref).map(|r| (r.uri.clone(), r.id.clone()))
        };
        if self.current == target {
            return Vec::new();
        }
        let mut out = Vec::new();
        if self.current.is_some() {
            out.extend_from_slice(b"\x1b]8;;\x1b\\");
        }
        if let Some((uri, id)) = &target {
            out.extend_from_slice(b"\x1b]8;");
            if !id.is_empty() {
                out.extend_from_slice(b"id=");
                out.extend_from_slice(id.as_bytes());
            }
            out.push(b';');
            out.extend_from_slice(uri.as_bytes());
            out.extend_from_slice(b"\x1b\\");
        }
        self.current = target;
        out
    }

    /// Bytes to close any currently open link, e.g. at end of frame.
    pub fn close(&mut self) -> Vec<u8> {
        if self.current.is_some() {
            self.current = None;
            b"\x1b]8;;\x1b\\".to_vec()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zr_cell::LinkTable;

    #[test]
    fn open_then_close_matches_known_vector() {
        let mut links = LinkTable::new();
        let r = links.intern("https://example.com", "").unwrap();
        let mut pen = LinkPen::new();
        let open = pen.transition(r, &links, true);
        assert_eq!(open, b"\x1b]8;;https://example.com\x1b\\");
        let close = pen.transition(0, &links, true);
        assert_eq!(close, b"\x1b]8;;\x1b\\");
    }

    #[test]
    fn equal_content_does_not_reopen_across_different_refs() {
        let mut a = LinkTable::new();
        let ra = a.intern("https://x", "1").unwrap();
        let mut pen = LinkPen::new();
        let _ = pen.transition(ra, &a, true);

        let mut b = LinkTable::new();
        // Force a different numeric ref but identical content.
        let _padding = b.intern("https://pad", "").unwrap();
        let rb = b.intern("https://x", "1").unwrap();
        assert_ne!(ra, rb);
        assert!(pen.transition(rb, &b, true).is_empty());
    }

    #[test]
    fn disabled_capability_never_emits() {
        let mut links = LinkTable::new();
        let r = links.intern("https://example.com", "").unwrap();
        let mut pen = LinkPen::new();
        assert!(pen.transition(r, &links, false).is_empty());
    }
}
