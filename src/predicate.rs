//! Compiled predicate tree and sorted-merge composition (spec.md §4.4's
//! "Scan composition"). Each leaf delegates to one column scan or index
//! probe; AND/OR compose the resulting ascending arrays by merge instead of
//! materialising a hash set, since every input is already sorted. NOT is
//! "scan_all minus the child set."

use crate::table::Table;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Predicate {
    Equals(usize, Value),
    Gt(usize, Value),
    Ge(usize, Value),
    Lt(usize, Value),
    Le(usize, Value),
    Between(usize, Value, Value),
    In(usize, Vec<Value>),
    EqualsStringIgnoreCase(usize, String),
    StartsWith(usize, String),
    EndsWith(usize, String),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Ascending-sorted arrays in, ascending-sorted array out; `a` and `b` are
/// each already deduplicated and sorted by construction (column scans and
/// index probes both guarantee this).
fn merge_intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn merge_union(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// `all` minus `subset`; both ascending, `subset` not necessarily a subset
/// of `all` in the type system's eyes but always is in practice (a
/// predicate's candidates are always live rows drawn from `scan_all`).
fn merge_difference(all: &[u32], subset: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(all.len());
    let (mut i, mut j) = (0, 0);
    while i < all.len() {
        if j < subset.len() && subset[j] == all[i] {
            i += 1;
            j += 1;
        } else if j < subset.len() && subset[j] < all[i] {
            j += 1;
        } else {
            out.push(all[i]);
            i += 1;
        }
    }
    out
}

pub fn evaluate(table: &Table, predicate: &Predicate) -> Vec<u32> {
    match predicate {
        Predicate::Equals(col, v) => table.scan_equals(*col, v),
        Predicate::Gt(col, v) => table.scan_gt(*col, v),
        Predicate::Ge(col, v) => table.scan_ge(*col, v),
        Predicate::Lt(col, v) => table.scan_lt(*col, v),
        Predicate::Le(col, v) => table.scan_le(*col, v),
        Predicate::Between(col, lo, hi) => table.scan_between(*col, lo, hi),
        Predicate::In(col, targets) => table.scan_in(*col, targets),
        Predicate::EqualsStringIgnoreCase(col, s) => table.scan_equals_string_ignore_case(*col, s),
        Predicate::StartsWith(col, s) => table.scan_starts_with(*col, s),
        Predicate::EndsWith(col, s) => table.scan_ends_with(*col, s),
        Predicate::And(l, r) => merge_intersect(&evaluate(table, l), &evaluate(table, r)),
        Predicate::Or(l, r) => merge_union(&evaluate(table, l), &evaluate(table, r)),
        Predicate::Not(inner) => merge_difference(&table.scan_all(), &evaluate(table, inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_keeps_only_common_elements() {
        assert_eq!(merge_intersect(&[1, 2, 3, 5], &[2, 3, 4]), vec![2, 3]);
    }

    #[test]
    fn union_dedupes_and_merges() {
        assert_eq!(merge_union(&[1, 3, 5], &[2, 3, 4]), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn difference_removes_subset_members() {
        assert_eq!(merge_difference(&[0, 1, 2, 3, 4], &[1, 3]), vec![0, 2, 4]);
    }
}
