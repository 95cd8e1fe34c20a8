//! String-only `startsWith` / `endsWith` indexes (spec.md §4.6). Both are
//! built the same way: a `BTreeMap` ordered by the (possibly reversed)
//! string, so that every key sharing a prefix sits in one contiguous range
//! and `starts_with` degenerates to a bounded range scan instead of a
//! linear filter over every entry.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::Validator;

fn collect_prefix(tree: &BTreeMap<String, Vec<u32>>, prefix: &str, validator: Validator) -> Vec<u32> {
    let mut out = Vec::new();
    for (key, rows) in tree.range(prefix.to_string()..) {
        if !key.starts_with(prefix) {
            break;
        }
        out.extend(rows.iter().copied().filter(|r| validator(*r)));
    }
    out.sort_unstable();
    out
}

pub struct PrefixIndex {
    tree: RwLock<BTreeMap<String, Vec<u32>>>,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self { tree: RwLock::new(BTreeMap::new()) }
    }

    pub fn add(&self, value: String, row_id: u32) {
        self.tree.write().entry(value).or_default().push(row_id);
    }

    pub fn remove(&self, value: &str, row_id: u32) {
        let mut tree = self.tree.write();
        if let Some(rows) = tree.get_mut(value) {
            rows.retain(|r| *r != row_id);
        }
    }

    pub fn starts_with(&self, prefix: &str, validator: Validator) -> Vec<u32> {
        collect_prefix(&self.tree.read(), prefix, validator)
    }
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Same structure as [`PrefixIndex`], keyed by the reversed string, so
/// `ends_with(s)` is `starts_with(s.reversed())` over the mirrored tree.
pub struct SuffixIndex {
    tree: RwLock<BTreeMap<String, Vec<u32>>>,
}

impl SuffixIndex {
    pub fn new() -> Self {
        Self { tree: RwLock::new(BTreeMap::new()) }
    }

    fn reversed(value: &str) -> String {
        value.chars().rev().collect()
    }

    pub fn add(&self, value: &str, row_id: u32) {
        self.tree.write().entry(Self::reversed(value)).or_default().push(row_id);
    }

    pub fn remove(&self, value: &str, row_id: u32) {
        let mut tree = self.tree.write();
        if let Some(rows) = tree.get_mut(&Self::reversed(value)) {
            rows.retain(|r| *r != row_id);
        }
    }

    pub fn ends_with(&self, suffix: &str, validator: Validator) -> Vec<u32> {
        collect_prefix(&self.tree.read(), &Self::reversed(suffix), validator)
    }
}

impl Default for SuffixIndex {
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
    fn starts_with_matches_only_sharing_prefix() {
        let idx = PrefixIndex::new();
        idx.add("Alice".into(), 0);
        idx.add("Alan".into(), 1);
        idx.add("Bob".into(), 2);
        let mut got = idx.starts_with("Al", &live);
        got.sort_unstable();
        assert_eq!(got, vec![0, 1]);
    }

    #[test]
    fn ends_with_matches_only_sharing_suffix() {
        let idx = SuffixIndex::new();
        idx.add("Bob", 0);
        idx.add("Job", 1);
        idx.add("Alice", 2);
        let mut got = idx.ends_with("ob", &live);
        got.sort_unstable();
        assert_eq!(got, vec![0, 1]);
    }
}
