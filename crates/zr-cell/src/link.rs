//! Framebuffer-owned hyperlink interning table.
//!
//! Reimplemented from the source's shared cyclic-capable link ownership as
//! pure value semantics: a vector of interned records addressed by 1-based
//! index, with equality across frames defined by (uri, id) content rather
//! than by index. `compact` drops unreachable entries so peak size stays
//! bounded by `cells_live + 1`.

use crate::error::{ZrError, ZrResult};
use std::collections::HashMap;

pub const LINK_URI_MAX_BYTES: usize = 2048;
pub const LINK_ID_MAX_BYTES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub uri: String,
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    // Index 0 is an unused placeholder so refs stay 1-based.
    entries: Vec<Option<LinkRecord>>,
}

impl LinkTable {
    pub fn new() -> Self {
        LinkTable {
            entries: vec![None],
        }
    }

    /// Intern (uri, id), returning an existing ref if content-equal to a
    /// live entry, otherwise appending a new one.
    pub fn intern(&mut self, uri: &str, id: &str) -> ZrResult<u32> {
        if uri.len() > LINK_URI_MAX_BYTES {
            return Err(ZrError::limit(format!(
                "link uri {} bytes exceeds max {}",
                uri.len(),
                LINK_URI_MAX_BYTES
            )));
        }
        if id.len() > LINK_ID_MAX_BYTES {
            return Err(ZrError::limit(format!(
                "link id {} bytes exceeds max {}",
                id.len(),
                LINK_ID_MAX_BYTES
            )));
        }
        for (idx, entry) in self.entries.iter().enumerate().skip(1) {
            if let Some(rec) = entry {
                if rec.uri == uri && rec.id == id {
                    return Ok(idx as u32);
                }
            }
        }
        self.entries.push(Some(LinkRecord {
            uri: uri.to_string(),
            id: id.to_string(),
        }));
        Ok((self.entries.len() - 1) as u32)
    }

    pub fn lookup(&self, link_ref: u32) -> Option<&LinkRecord> {
        if link_ref == 0 {
            return None;
        }
        self.entries.get(link_ref as usize).and_then(|e| e.as_ref())
    }

    /// Drop every entry whose index is not in `reachable`, returning an
    /// old-ref -> new-ref remap for callers to apply to their cells.
    pub fn compact(&mut self, reachable: &std::collections::HashSet<u32>) -> HashMap<u32, u32> {
        let mut remap = HashMap::new();
        let mut new_entries = vec![None];
        for (old_idx, entry) in self.entries.iter().enumerate().skip(1) {
            if reachable.contains(&(old_idx as u32)) {
                if let Some(rec) = entry {
                    new_entries.push(Some(rec.clone()));
                    remap.insert(old_idx as u32, (new_entries.len() - 1) as u32);
                }
            }
        }
        self.entries = new_entries;
        remap
    }

    pub fn len(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_intern_returns_same_ref() {
        let mut t = LinkTable::new();
        let a = t.intern("https://example.com", "").unwrap();
        let b = t.intern("https://example.com", "").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_content_gets_distinct_refs() {
        let mut t = LinkTable::new();
        let a = t.intern("https://example.com", "").unwrap();
        let b = t.intern("https://example.org", "").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn oversized_uri_is_rejected() {
        let mut t = LinkTable::new();
        let huge = "x".repeat(LINK_URI_MAX_BYTES + 1);
        assert!(t.intern(&huge, "").is_err());
    }

    #[test]
    fn compaction_drops_unreachable_and_remaps_live() {
        let mut t = LinkTable::new();
        let a = t.intern("https://a", "").unwrap();
        let b = t.intern("https://b", "").unwrap();
        let mut reachable = std::collections::HashSet::new();
        reachable.insert(b);
        let remap = t.compact(&reachable);
        assert!(!remap.contains_key(&a));
        let new_b = remap[&b];
        assert_eq!(t.lookup(new_b).unwrap().uri, "https://b");
        assert_eq!(t.len(), 1);
    }
}
