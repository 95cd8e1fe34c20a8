//! Multi-column indexes (spec.md §4.6): same shape as [`super::HashIndex`]
//! and [`super::RangeIndex`], keyed by a `Vec<IndexKey>` tuple instead of a
//! single key. `Vec<T>`'s derived `Ord` is already lexicographic, which is
//! the only range semantics composite-range needs to support.

use std::collections::BTreeMap;

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;

use super::Validator;
use crate::value::IndexKey;

pub type CompositeKey = Vec<IndexKey>;

pub struct CompositeHashIndex {
    buckets: DashMap<CompositeKey, DashSet<u32>>,
}

impl CompositeHashIndex {
    pub fn new() -> Self {
        Self { buckets: DashMap::new() }
    }

    pub fn add(&self, key: CompositeKey, row_id: u32) {
        self.buckets.entry(key).or_insert_with(DashSet::new).insert(row_id);
    }

    pub fn remove(&self, key: &CompositeKey, row_id: u32) {
        if let Some(bucket) = self.buckets.get(key) {
            bucket.remove(&row_id);
        }
    }

    pub fn lookup(&self, key: &CompositeKey, validator: Validator) -> Vec<u32> {
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

impl Default for CompositeHashIndex {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CompositeRangeIndex {
    tree: RwLock<BTreeMap<CompositeKey, Vec<u32>>>,
}

impl CompositeRangeIndex {
    pub fn new() -> Self {
        Self { tree: RwLock::new(BTreeMap::new()) }
    }

    pub fn add(&self, key: CompositeKey, row_id: u32) {
        self.tree.write().entry(key).or_default().push(row_id);
    }

    pub fn remove(&self, key: &CompositeKey, row_id: u32) {
        let mut tree = self.tree.write();
        if let Some(rows) = tree.get_mut(key) {
            rows.retain(|r| *r != row_id);
        }
    }

    pub fn lookup(&self, key: &CompositeKey, validator: Validator) -> Vec<u32> {
        let tree = self.tree.read();
        let mut out: Vec<u32> = tree
            .get(key)
            .into_iter()
            .flat_map(|rows| rows.iter().copied())
            .filter(|r| validator(*r))
            .collect();
        out.sort_unstable();
        out
    }

    /// Inclusive lexicographic range; empty when `lo > hi`.
    pub fn between(&self, lo: &CompositeKey, hi: &CompositeKey, validator: Validator) -> Vec<u32> {
        if lo > hi {
            return Vec::new();
        }
        let tree = self.tree.read();
        let mut out: Vec<u32> = tree
            .range(lo.clone()..=hi.clone())
            .flat_map(|(_, rows)| rows.iter().copied())
            .filter(|r| validator(*r))
            .collect();
        out.sort_unstable();
        out
    }
}

impl Default for CompositeRangeIndex {
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
    fn hash_lookup_roundtrips() {
        let idx = CompositeHashIndex::new();
        let key = vec![IndexKey::Long(1), IndexKey::String("x".into())];
        idx.add(key.clone(), 0);
        assert_eq!(idx.lookup(&key, &live), vec![0]);
    }

    #[test]
    fn range_between_is_lexicographic() {
        let idx = CompositeRangeIndex::new();
        idx.add(vec![IndexKey::Int(1), IndexKey::Int(1)], 0);
        idx.add(vec![IndexKey::Int(1), IndexKey::Int(5)], 1);
        idx.add(vec![IndexKey::Int(2), IndexKey::Int(0)], 2);
        let lo = vec![IndexKey::Int(1), IndexKey::Int(0)];
        let hi = vec![IndexKey::Int(1), IndexKey::Int(9)];
        assert_eq!(idx.between(&lo, &hi, &live), vec![0, 1]);
    }
}
