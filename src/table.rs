//! Binds one row allocator and an ordered list of page columns into the
//! table operations of spec.md §4.4: insert / read / scan / lookup /
//! tombstone with the mandatory row-level ordering those operations require.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;

use crate::allocator::RowAllocator;
use crate::column::typed::TypedColumn;
use crate::error::{Result, RowStoreError};
use crate::index::{
    CompositeHashIndex, CompositeRangeIndex, HashIndex, IdIndex, PrefixIndex, RangeIndex, SuffixIndex,
};
use crate::reference::{self, RowRef, NONE};
use crate::seqlock;
use crate::value::{IndexKey, TypeCode, Value};
use crate::TableConfig;

/// One column's declaration at table-construction time (spec.md §6).
pub struct ColumnSpec {
    pub name: String,
    pub type_code: TypeCode,
    pub is_id: bool,
    pub is_id_unique: bool,
    pub is_primitive_non_null: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, type_code: TypeCode) -> Self {
        Self { name: name.into(), type_code, is_id: false, is_id_unique: false, is_primitive_non_null: false }
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self.is_id_unique = true;
        self
    }

    pub fn non_null(mut self) -> Self {
        self.is_primitive_non_null = true;
        self
    }
}

pub struct Table {
    name: String,
    columns: Vec<(String, TypedColumn)>,
    column_index: HashMap<String, usize>,
    id_column: usize,
    allocator: RowAllocator,
    tombstoned: Vec<AtomicBool>,
    row_count: AtomicU64,
    id_index: IdIndex,
    hash_indexes: DashMap<usize, HashIndex>,
    range_indexes: DashMap<usize, RangeIndex>,
    prefix_indexes: DashMap<usize, PrefixIndex>,
    suffix_indexes: DashMap<usize, SuffixIndex>,
    composite_hash_indexes: DashMap<String, (Vec<usize>, CompositeHashIndex)>,
    composite_range_indexes: DashMap<String, (Vec<usize>, CompositeRangeIndex)>,
}

impl Table {
    pub fn new(name: impl Into<String>, specs: Vec<ColumnSpec>, config: TableConfig) -> Self {
        let name = name.into();
        let TableConfig { page_size, max_pages, initial_pages } = config;
        let capacity = page_size * max_pages;
        let id_column = specs
            .iter()
            .position(|s| s.is_id)
            .expect("a table must declare exactly one id column");
        assert_eq!(specs.iter().filter(|s| s.is_id).count(), 1, "a table must declare exactly one id column");

        let mut column_index = HashMap::with_capacity(specs.len());
        let mut columns = Vec::with_capacity(specs.len());
        for (i, spec) in specs.into_iter().enumerate() {
            column_index.insert(spec.name.clone(), i);
            columns.push((spec.name, TypedColumn::new(spec.type_code, page_size, max_pages, initial_pages)));
        }

        let mut tombstoned = Vec::with_capacity(capacity);
        tombstoned.resize_with(capacity, || AtomicBool::new(false));

        log::info!("table '{}': {} columns, capacity {}", name, columns.len(), capacity);

        Self {
            name,
            columns,
            column_index,
            id_column,
            allocator: RowAllocator::new(page_size, max_pages),
            tombstoned,
            row_count: AtomicU64::new(0),
            id_index: IdIndex::new(),
            hash_indexes: DashMap::new(),
            range_indexes: DashMap::new(),
            prefix_indexes: DashMap::new(),
            suffix_indexes: DashMap::new(),
            composite_hash_indexes: DashMap::new(),
            composite_range_indexes: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> usize {
        *self.column_index.get(name).unwrap_or_else(|| panic!("unknown column '{name}'"))
    }

    pub fn row_count(&self) -> u64 {
        self.row_count.load(Ordering::Acquire)
    }

    pub fn allocated_count(&self) -> u64 {
        self.allocator.allocated_count() as u64
    }

    fn is_live_row(&self, row_index: u32) -> bool {
        (row_index as usize) < self.tombstoned.len() && !self.tombstoned[row_index as usize].load(Ordering::Acquire)
    }

    fn is_live_with_generation(&self, row_id: u32, generation: u32) -> bool {
        self.is_live_row(row_id) && self.allocator.generation(row_id) == generation
    }

    pub fn is_live(&self, r: RowRef) -> bool {
        if r == NONE {
            return false;
        }
        self.is_live_with_generation(reference::row_index(r), reference::generation(r))
    }

    // ---- construction-time / runtime index registration (spec.md §6) ----

    pub fn register_hash_index(&self, column: &str) {
        let idx = self.column_index(column);
        if self.hash_indexes.contains_key(&idx) {
            return;
        }
        let index = HashIndex::new();
        for row in self.scan_all() {
            if let Some(key) = IndexKey::from_value(&self.columns[idx].1.get(row as usize)) {
                index.add(key, row);
            }
        }
        self.hash_indexes.insert(idx, index);
    }

    pub fn register_range_index(&self, column: &str) {
        let idx = self.column_index(column);
        if self.range_indexes.contains_key(&idx) {
            return;
        }
        let index = RangeIndex::new();
        for row in self.scan_all() {
            if let Some(key) = IndexKey::from_value(&self.columns[idx].1.get(row as usize)) {
                index.add(key, row);
            }
        }
        self.range_indexes.insert(idx, index);
    }

    pub fn register_prefix_index(&self, column: &str) {
        let idx = self.column_index(column);
        assert_eq!(self.columns[idx].1.type_code(), TypeCode::String, "IndexTypeMismatch: prefix index requires a string column");
        if self.prefix_indexes.contains_key(&idx) {
            return;
        }
        let index = PrefixIndex::new();
        for row in self.scan_all() {
            if let Value::String(s) = self.columns[idx].1.get(row as usize) {
                index.add(s, row);
            }
        }
        self.prefix_indexes.insert(idx, index);
    }

    pub fn register_suffix_index(&self, column: &str) {
        let idx = self.column_index(column);
        assert_eq!(self.columns[idx].1.type_code(), TypeCode::String, "IndexTypeMismatch: suffix index requires a string column");
        if self.suffix_indexes.contains_key(&idx) {
            return;
        }
        let index = SuffixIndex::new();
        for row in self.scan_all() {
            if let Value::String(s) = self.columns[idx].1.get(row as usize) {
                index.add(&s, row);
            }
        }
        self.suffix_indexes.insert(idx, index);
    }

    pub fn register_composite_hash_index(&self, name: &str, columns: &[&str]) {
        if self.composite_hash_indexes.contains_key(name) {
            return;
        }
        let idxs: Vec<usize> = columns.iter().map(|c| self.column_index(c)).collect();
        let index = CompositeHashIndex::new();
        for row in self.scan_all() {
            if let Some(key) = self.composite_key(&idxs, row) {
                index.add(key, row);
            }
        }
        self.composite_hash_indexes.insert(name.to_string(), (idxs, index));
    }

    pub fn register_composite_range_index(&self, name: &str, columns: &[&str]) {
        if self.composite_range_indexes.contains_key(name) {
            return;
        }
        let idxs: Vec<usize> = columns.iter().map(|c| self.column_index(c)).collect();
        let index = CompositeRangeIndex::new();
        for row in self.scan_all() {
            if let Some(key) = self.composite_key(&idxs, row) {
                index.add(key, row);
            }
        }
        self.composite_range_indexes.insert(name.to_string(), (idxs, index));
    }

    fn composite_key(&self, idxs: &[usize], row: u32) -> Option<Vec<IndexKey>> {
        idxs.iter().map(|&i| IndexKey::from_value(&self.columns[i].1.get(row as usize))).collect()
    }

    // ---- insert / tombstone (spec.md §4.4) ----

    pub fn insert(&self, tuple: &[Value]) -> Result<RowRef> {
        assert_eq!(tuple.len(), self.columns.len(), "tuple arity does not match table column count");

        let id_key = IndexKey::from_value(&tuple[self.id_column]).expect("id column value must not be null");
        if self
            .id_index
            .lookup(&id_key, |row_id, generation| self.is_live_with_generation(row_id, generation))
            .is_some()
        {
            return Err(RowStoreError::DuplicateId);
        }

        let (row_index, generation) = self.allocator.allocate()?;
        let seq = self.allocator.seq(row_index);

        seq.begin_write();
        for (value, (_, column)) in tuple.iter().zip(self.columns.iter()) {
            column.set(row_index as usize, value);
        }
        for (_, column) in &self.columns {
            column.publish(row_index as usize + 1);
        }
        seq.end_write();
        self.tombstoned[row_index as usize].store(false, Ordering::Release);
        self.row_count.fetch_add(1, Ordering::AcqRel);

        self.id_index.put(id_key, row_index, generation);
        for entry in self.hash_indexes.iter() {
            let idx = *entry.key();
            if let Some(key) = IndexKey::from_value(&self.columns[idx].1.get(row_index as usize)) {
                entry.value().add(key, row_index);
            }
        }
        for entry in self.range_indexes.iter() {
            let idx = *entry.key();
            if let Some(key) = IndexKey::from_value(&self.columns[idx].1.get(row_index as usize)) {
                entry.value().add(key, row_index);
            }
        }
        for entry in self.prefix_indexes.iter() {
            let idx = *entry.key();
            if let Value::String(s) = self.columns[idx].1.get(row_index as usize) {
                entry.value().add(s, row_index);
            }
        }
        for entry in self.suffix_indexes.iter() {
            let idx = *entry.key();
            if let Value::String(s) = self.columns[idx].1.get(row_index as usize) {
                entry.value().add(&s, row_index);
            }
        }
        for entry in self.composite_hash_indexes.iter() {
            let (idxs, index) = entry.value();
            if let Some(key) = self.composite_key(idxs, row_index) {
                index.add(key, row_index);
            }
        }
        for entry in self.composite_range_indexes.iter() {
            let (idxs, index) = entry.value();
            if let Some(key) = self.composite_key(idxs, row_index) {
                index.add(key, row_index);
            }
        }

        log::trace!("table '{}': inserted row {row_index} (generation {generation})", self.name);
        Ok(reference::pack(row_index, generation))
    }

    /// Returns `true` iff `r` was live at the moment of the call and the
    /// tombstone transition was applied exactly once (spec.md §4.4, §8
    /// property 4). The row's tombstone bit doubles as the CAS that decides
    /// the single winner among concurrent callers: whichever thread flips
    /// it false->true owns the transition, and a post-flip generation
    /// re-check catches the case where the row was tombstoned and reused by
    /// someone else between our generation read and our CAS.
    pub fn tombstone(&self, r: RowRef) -> bool {
        if r == NONE {
            return false;
        }
        let row_index = reference::row_index(r);
        let generation_in_ref = reference::generation(r);
        if row_index as usize >= self.tombstoned.len() {
            return false;
        }
        let seq = self.allocator.seq(row_index);

        if seq.generation() != generation_in_ref {
            return false;
        }
        if self.tombstoned[row_index as usize]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        if seq.generation() != generation_in_ref {
            self.tombstoned[row_index as usize].store(false, Ordering::Release);
            return false;
        }

        let id_value = self.columns[self.id_column].1.get(row_index as usize);
        let indexed_values: Vec<(usize, Value)> = self
            .hash_indexes
            .iter()
            .map(|e| *e.key())
            .chain(self.range_indexes.iter().map(|e| *e.key()))
            .chain(self.prefix_indexes.iter().map(|e| *e.key()))
            .chain(self.suffix_indexes.iter().map(|e| *e.key()))
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .map(|idx| (idx, self.columns[idx].1.get(row_index as usize)))
            .collect();
        let composite_keys: Vec<(String, Vec<IndexKey>)> = self
            .composite_hash_indexes
            .iter()
            .filter_map(|e| self.composite_key(&e.value().0, row_index).map(|k| (e.key().clone(), k)))
            .chain(
                self.composite_range_indexes
                    .iter()
                    .filter_map(|e| self.composite_key(&e.value().0, row_index).map(|k| (e.key().clone(), k))),
            )
            .collect();

        seq.begin_write();
        for (_, column) in &self.columns {
            column.set_null(row_index as usize);
        }
        seq.tombstone_commit();

        self.allocator.deallocate(row_index);
        self.row_count.fetch_sub(1, Ordering::AcqRel);

        if let Some(key) = IndexKey::from_value(&id_value) {
            self.id_index.remove(&key);
        }
        for (idx, value) in indexed_values {
            if let Some(key) = IndexKey::from_value(&value) {
                if let Some(h) = self.hash_indexes.get(&idx) {
                    h.remove(&key, row_index);
                }
                if let Some(r) = self.range_indexes.get(&idx) {
                    r.remove(&key, row_index);
                }
            }
            if let Value::String(s) = &value {
                if let Some(p) = self.prefix_indexes.get(&idx) {
                    p.remove(s, row_index);
                }
                if let Some(suf) = self.suffix_indexes.get(&idx) {
                    suf.remove(s, row_index);
                }
            }
        }
        for (name, key) in composite_keys {
            if let Some(h) = self.composite_hash_indexes.get(&name) {
                h.value().1.remove(&key, row_index);
            }
            if let Some(r) = self.composite_range_indexes.get(&name) {
                r.value().1.remove(&key, row_index);
            }
        }

        log::trace!("table '{}': tombstoned row {row_index} (generation {generation_in_ref})", self.name);
        true
    }

    // ---- reads ----

    pub fn read(&self, column: usize, row_index: u32) -> Value {
        self.columns[column].1.get(row_index as usize)
    }

    pub fn read_present(&self, column: usize, row_index: u32) -> bool {
        self.columns[column].1.is_present(row_index as usize)
    }

    /// Reads every column for `r` inside the row's seqlock retry loop,
    /// re-validating liveness before and after so a tombstone racing the
    /// read cannot be mistaken for a consistent snapshot.
    pub fn read_row_consistent(&self, r: RowRef) -> Option<Vec<Value>> {
        if !self.is_live(r) {
            return None;
        }
        let row_index = reference::row_index(r) as usize;
        let seq = self.allocator.seq(row_index as u32);
        let snapshot = seqlock::read_consistent(seq, || self.columns.iter().map(|(_, c)| c.get(row_index)).collect::<Vec<_>>());
        if !self.is_live(r) {
            return None;
        }
        Some(snapshot)
    }

    pub fn lookup_by_id(&self, id: &Value) -> Option<RowRef> {
        let key = IndexKey::from_value(id)?;
        let row_id = self.id_index.lookup(&key, |row_id, generation| self.is_live_with_generation(row_id, generation))?;
        Some(reference::pack(row_id, self.allocator.generation(row_id)))
    }

    /// Ascending row indices of live rows, bounded by the id column's
    /// watermark (the id column is present for a row iff it is live, since
    /// tombstone clears presence on every column).
    pub fn scan_all(&self) -> Vec<u32> {
        let id_col = &self.columns[self.id_column].1;
        let w = id_col.published_count();
        (0..w as u32).filter(|&i| id_col.is_present(i as usize)).collect()
    }

    pub fn scan_equals(&self, column: usize, target: &Value) -> Vec<u32> {
        self.columns[column].1.scan_equals(target, usize::MAX)
    }

    pub fn scan_gt(&self, column: usize, target: &Value) -> Vec<u32> {
        self.columns[column].1.scan_gt(target, usize::MAX)
    }

    pub fn scan_ge(&self, column: usize, target: &Value) -> Vec<u32> {
        self.columns[column].1.scan_ge(target, usize::MAX)
    }

    pub fn scan_lt(&self, column: usize, target: &Value) -> Vec<u32> {
        self.columns[column].1.scan_lt(target, usize::MAX)
    }

    pub fn scan_le(&self, column: usize, target: &Value) -> Vec<u32> {
        self.columns[column].1.scan_le(target, usize::MAX)
    }

    pub fn scan_between(&self, column: usize, lo: &Value, hi: &Value) -> Vec<u32> {
        self.columns[column].1.scan_between(lo, hi, usize::MAX)
    }

    pub fn scan_in(&self, column: usize, targets: &[Value]) -> Vec<u32> {
        self.columns[column].1.scan_in(targets, usize::MAX)
    }

    pub fn scan_equals_string_ignore_case(&self, column: usize, target: &str) -> Vec<u32> {
        self.columns[column].1.scan_equals_ignore_case(target, usize::MAX)
    }

    pub fn scan_starts_with(&self, column: usize, prefix: &str) -> Vec<u32> {
        self.columns[column].1.scan_starts_with(prefix, usize::MAX)
    }

    pub fn scan_ends_with(&self, column: usize, suffix: &str) -> Vec<u32> {
        self.columns[column].1.scan_ends_with(suffix, usize::MAX)
    }

    // ---- index probes (spec.md §4.6), pre-filtered against table liveness ----

    pub fn hash_lookup(&self, column: &str, target: &Value) -> Vec<u32> {
        let idx = self.column_index(column);
        let key = match IndexKey::from_value(target) {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.hash_indexes.get(&idx).map(|h| h.lookup(&key, &validator)).unwrap_or_default()
    }

    pub fn range_between(&self, column: &str, lo: &Value, hi: &Value) -> Vec<u32> {
        let idx = self.column_index(column);
        let (lo, hi) = match (IndexKey::from_value(lo), IndexKey::from_value(hi)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.range_indexes.get(&idx).map(|r| r.between(&lo, &hi, &validator)).unwrap_or_default()
    }

    pub fn range_greater_than(&self, column: &str, target: &Value) -> Vec<u32> {
        let idx = self.column_index(column);
        let key = match IndexKey::from_value(target) {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.range_indexes.get(&idx).map(|r| r.greater_than(&key, &validator)).unwrap_or_default()
    }

    pub fn range_greater_than_or_equal(&self, column: &str, target: &Value) -> Vec<u32> {
        let idx = self.column_index(column);
        let key = match IndexKey::from_value(target) {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.range_indexes.get(&idx).map(|r| r.greater_than_or_equal(&key, &validator)).unwrap_or_default()
    }

    pub fn range_less_than(&self, column: &str, target: &Value) -> Vec<u32> {
        let idx = self.column_index(column);
        let key = match IndexKey::from_value(target) {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.range_indexes.get(&idx).map(|r| r.less_than(&key, &validator)).unwrap_or_default()
    }

    pub fn range_less_than_or_equal(&self, column: &str, target: &Value) -> Vec<u32> {
        let idx = self.column_index(column);
        let key = match IndexKey::from_value(target) {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.range_indexes.get(&idx).map(|r| r.less_than_or_equal(&key, &validator)).unwrap_or_default()
    }

    pub fn prefix_lookup(&self, column: &str, prefix: &str) -> Vec<u32> {
        let idx = self.column_index(column);
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.prefix_indexes.get(&idx).map(|p| p.starts_with(prefix, &validator)).unwrap_or_default()
    }

    pub fn suffix_lookup(&self, column: &str, suffix: &str) -> Vec<u32> {
        let idx = self.column_index(column);
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.suffix_indexes.get(&idx).map(|s| s.ends_with(suffix, &validator)).unwrap_or_default()
    }

    pub fn composite_hash_lookup(&self, name: &str, key: &[Value]) -> Vec<u32> {
        let key: Vec<IndexKey> = match key.iter().map(IndexKey::from_value).collect() {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.composite_hash_indexes.get(name).map(|e| e.value().1.lookup(&key, &validator)).unwrap_or_default()
    }

    pub fn composite_range_lookup(&self, name: &str, key: &[Value]) -> Vec<u32> {
        let key: Vec<IndexKey> = match key.iter().map(IndexKey::from_value).collect() {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.composite_range_indexes.get(name).map(|e| e.value().1.lookup(&key, &validator)).unwrap_or_default()
    }

    pub fn composite_range_between(&self, name: &str, lo: &[Value], hi: &[Value]) -> Vec<u32> {
        let lo: Vec<IndexKey> = match lo.iter().map(IndexKey::from_value).collect() {
            Some(k) => k,
            None => return Vec::new(),
        };
        let hi: Vec<IndexKey> = match hi.iter().map(IndexKey::from_value).collect() {
            Some(k) => k,
            None => return Vec::new(),
        };
        let validator = |row_id: u32| self.is_live_row(row_id);
        self.composite_range_indexes.get(name).map(|e| e.value().1.between(&lo, &hi, &validator)).unwrap_or_default()
    }
}
