//! Equality-probe secondary index (spec.md §4.6): value -> set of row ids.

use dashmap::{DashMap, DashSet};

use crate::value::IndexKey;
use super::Validator;

pub struct HashIndex {
    buckets: DashMap<IndexKey, DashSet<u32>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self { buckets: DashMap::new() }
    }

    pub fn add(&self, key: IndexKey, row_id: u32) {
        self.buckets.entry(key).or_insert_with(DashSet::new).insert(row_id);
    }

    /// Best-effort (spec.md §4.4 step 7): a missing bucket or entry is not an
    /// error, it just means the stale reference will be filtered at query
    /// time instead of removed here.
    pub fn remove(&self, key: &IndexKey, row_id: u32) {
        if let Some(bucket) = self.buckets.get(key) {
            bucket.remove(&row_id);
        }
    }

    pub fn lookup(&self, key: &IndexKey, validator: Validator) -> Vec<u32> {
        match self.buckets.get(key) {
            Some(bucket) => {
                let mut out: Vec<u32> = bucket.iter().map(|r| *r).filter(|r| validator(*r)).collect();
                out.sort_unstable();
                out
            }
            None => Vec::new(),
        }
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_filters_through_validator() {
        let idx = HashIndex::new();
        idx.add(IndexKey::Int(7), 0);
        idx.add(IndexKey::Int(7), 1);
        let live = |r: u32| r != 1;
        assert_eq!(idx.lookup(&IndexKey::Int(7), &live), vec![0]);
    }

    #[test]
    fn remove_is_best_effort_on_missing_bucket() {
        let idx = HashIndex::new();
        idx.remove(&IndexKey::Int(1), 0);
        assert_eq!(idx.lookup(&IndexKey::Int(1), &|_| true), Vec::<u32>::new());
    }

    #[test]
    fn unknown_key_returns_empty() {
        let idx = HashIndex::new();
        assert_eq!(idx.lookup(&IndexKey::Int(99), &|_| true), Vec::<u32>::new());
    }
}
