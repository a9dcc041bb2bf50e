//! Resource tables threaded across drawlists: `DEF_STRING`/`FREE_STRING`
//! and `DEF_BLOB`/`FREE_BLOB` form a resource-lifetime protocol.
//!
//! Reimplemented as generational maps: freeing an id removes it outright,
//! so a stale reference in a later drawlist fails validation rather than
//! silently resolving to a reused slot.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ResourceTables {
    strings: HashMap<u32, String>,
    blobs: HashMap<u32, Vec<u8>>,
}

impl ResourceTables {
    pub fn new() -> Self {
        ResourceTables::default()
    }

    pub fn def_string(&mut self, id: u32, value: String) {
        self.strings.insert(id, value);
    }

    pub fn free_string(&mut self, id: u32) -> bool {
        self.strings.remove(&id).is_some()
    }

    pub fn get_string(&self, id: u32) -> Option<&str> {
        self.strings.get(&id).map(|s| s.as_str())
    }

    pub fn def_blob(&mut self, id: u32, value: Vec<u8>) {
        self.blobs.insert(id, value);
    }

    pub fn free_blob(&mut self, id: u32) -> bool {
        self.blobs.remove(&id).is_some()
    }

    pub fn get_blob(&self, id: u32) -> Option<&[u8]> {
        self.blobs.get(&id).map(|b| b.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_id_is_no_longer_resolvable() {
        let mut t = ResourceTables::new();
        t.def_string(1, "hi".into());
        assert!(t.free_string(1));
        assert!(t.get_string(1).is_none());
    }

    #[test]
    fn overwriting_a_live_id_replaces_it() {
        let mut t = ResourceTables::new();
        t.def_string(1, "a".into());
        t.def_string(1, "b".into());
        assert_eq!(t.get_string(1), Some("b"));
    }
}
