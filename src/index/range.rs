//! Ordered secondary index (spec.md §4.6): supports equality and the full
//! set of ordered-comparison probes over a `BTreeMap`, which gives range
//! queries for free instead of hand-rolling a skip list or B-tree.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use super::Validator;
use crate::value::IndexKey;

pub struct RangeIndex {
    tree: RwLock<BTreeMap<IndexKey, Vec<u32>>>,
}

impl RangeIndex {
    pub fn new() -> Self {
        Self { tree: RwLock::new(BTreeMap::new()) }
    }

    pub fn add(&self, key: IndexKey, row_id: u32) {
        self.tree.write().entry(key).or_default().push(row_id);
    }

    pub fn remove(&self, key: &IndexKey, row_id: u32) {
        let mut tree = self.tree.write();
        if let Some(rows) = tree.get_mut(key) {
            rows.retain(|r| *r != row_id);
        }
    }

    fn collect(&self, range: impl std::ops::RangeBounds<IndexKey>, validator: Validator) -> Vec<u32> {
        let tree = self.tree.read();
        let mut out: Vec<u32> = tree
            .range(range)
            .flat_map(|(_, rows)| rows.iter().copied())
            .filter(|r| validator(*r))
            .collect();
        out.sort_unstable();
        out
    }

    pub fn lookup(&self, key: &IndexKey, validator: Validator) -> Vec<u32> {
        self.collect((Bound::Included(key.clone()), Bound::Included(key.clone())), validator)
    }

    pub fn greater_than(&self, key: &IndexKey, validator: Validator) -> Vec<u32> {
        self.collect((Bound::Excluded(key.clone()), Bound::Unbounded), validator)
    }

    pub fn greater_than_or_equal(&self, key: &IndexKey, validator: Validator) -> Vec<u32> {
        self.collect((Bound::Included(key.clone()), Bound::Unbounded), validator)
    }

    pub fn less_than(&self, key: &IndexKey, validator: Validator) -> Vec<u32> {
        self.collect((Bound::Unbounded, Bound::Excluded(key.clone())), validator)
    }

    pub fn less_than_or_equal(&self, key: &IndexKey, validator: Validator) -> Vec<u32> {
        self.collect((Bound::Unbounded, Bound::Included(key.clone())), validator)
    }

    /// Inclusive on both ends; empty when `lo > hi` (mirrors the column
    /// scan's `scan_between` contract).
    pub fn between(&self, lo: &IndexKey, hi: &IndexKey, validator: Validator) -> Vec<u32> {
        if lo > hi {
            return Vec::new();
        }
        self.collect((Bound::Included(lo.clone()), Bound::Included(hi.clone())), validator)
    }
}

impl Default for RangeIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(_: u32) -> bool {
        true
    }

    #[test]
    fn between_is_inclusive_and_empty_when_reversed() {
        let idx = RangeIndex::new();
        idx.add(IndexKey::Int(100), 0);
        idx.add(IndexKey::Int(200), 1);
        idx.add(IndexKey::Int(300), 2);
        assert_eq!(idx.between(&IndexKey::Int(150), &IndexKey::Int(250), &live), vec![1]);
        assert_eq!(idx.between(&IndexKey::Int(100), &IndexKey::Int(300), &live), vec![0, 1, 2]);
        assert_eq!(idx.between(&IndexKey::Int(300), &IndexKey::Int(100), &live), Vec::<u32>::new());
    }

    #[test]
    fn ordered_comparisons() {
        let idx = RangeIndex::new();
        for (v, r) in [(1, 0), (2, 1), (3, 2)] {
            idx.add(IndexKey::Int(v), r);
        }
        assert_eq!(idx.greater_than(&IndexKey::Int(1), &live), vec![1, 2]);
        assert_eq!(idx.greater_than_or_equal(&IndexKey::Int(2), &live), vec![1, 2]);
        assert_eq!(idx.less_than(&IndexKey::Int(3), &live), vec![0, 1]);
        assert_eq!(idx.less_than_or_equal(&IndexKey::Int(2), &live), vec![0, 1]);
    }

    #[test]
    fn remove_drops_row_from_its_key() {
        let idx = RangeIndex::new();
        idx.add(IndexKey::Int(5), 0);
        idx.remove(&IndexKey::Int(5), 0);
        assert_eq!(idx.lookup(&IndexKey::Int(5), &live), Vec::<u32>::new());
    }
}
