//! Primary-key index (spec.md §4.5): id value -> `(row_id, generation at
//! publication)`. Built on [`dashmap::DashMap`] the way the teacher reaches
//! for a segmented concurrent map instead of one coarse `RwLock<HashMap<_>>`
//! — per-key writers don't contend with readers of unrelated keys, which
//! matters here because every insert and tombstone touches this map.

use dashmap::DashMap;

use crate::value::IndexKey;

pub struct IdIndex {
    entries: DashMap<IndexKey, (u32, u32)>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Replaces any existing entry for `key` (spec.md §4.5: "existing entries
    /// for the same key are replaced").
    pub fn put(&self, key: IndexKey, row_id: u32, generation: u32) {
        self.entries.insert(key, (row_id, generation));
    }

    /// Returns the row id only if `current_generation(row_id) ==` the
    /// generation stored at publication time and the row is not tombstoned;
    /// `is_live` encodes both checks since only the table can answer them.
    pub fn lookup(&self, key: &IndexKey, is_live: impl Fn(u32, u32) -> bool) -> Option<u32> {
        let (row_id, generation) = *self.entries.get(key)?;
        if is_live(row_id, generation) {
            Some(row_id)
        } else {
            None
        }
    }

    pub fn remove(&self, key: &IndexKey) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IdIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_lookup_with_matching_generation() {
        let idx = IdIndex::new();
        idx.put(IndexKey::Long(1), 0, 0);
        assert_eq!(idx.lookup(&IndexKey::Long(1), |_, g| g == 0), Some(0));
        assert_eq!(idx.lookup(&IndexKey::Long(1), |_, g| g == 1), None);
    }

    #[test]
    fn put_replaces_existing_entry_for_same_key() {
        let idx = IdIndex::new();
        idx.put(IndexKey::Long(1), 0, 0);
        idx.put(IndexKey::Long(1), 5, 2);
        assert_eq!(idx.lookup(&IndexKey::Long(1), |_, _| true), Some(5));
    }

    #[test]
    fn remove_makes_key_unfindable() {
        let idx = IdIndex::new();
        idx.put(IndexKey::String("a".into()), 3, 0);
        idx.remove(&IndexKey::String("a".into()));
        assert_eq!(idx.lookup(&IndexKey::String("a".into()), |_, _| true), None);
    }
}
