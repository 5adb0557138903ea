//! Per-scene content-addressed geometry cache (§3, §8 invariant 6): the
//! same [`GeometryRef`] content hash, drawn by many items, is stored and
//! transformed exactly once upstream of rasterization.

use std::collections::HashMap;

use crate::GeometryRef;

/// Maps a [`crate::Geometry::hash`] to the canonical [`GeometryRef`] first
/// interned under that hash.
#[derive(Default, Debug)]
pub struct Cache {
    entries: HashMap<u64, GeometryRef>,
}

impl Cache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical instance for `path`'s content hash, storing
    /// `path` itself the first time that hash is seen.
    pub fn intern(&mut self, path: GeometryRef) -> GeometryRef {
        let hash = path.hash();
        self.entries.entry(hash).or_insert(path).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
