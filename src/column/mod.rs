//! Typed, paged, append-grown storage of one attribute (spec.md §4.1).
//!
//! Each page is a `parking_lot::RwLock`-guarded slab of `page_size` cells
//! plus a parallel presence bit per cell. A page's lock is held only for the
//! duration of a single cell write or a single page's worth of a scan —
//! this keeps the per-column hot path safe (no raw unsynchronized aliasing
//! across threads) while staying cheap: the spec's cross-column consistency
//! guarantee comes from the row-level seqlock in [`crate::seqlock`], not
//! from this lock, so a page lock is never held across more than one
//! column's worth of work.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub mod typed;

/// Bound on the value types a [`PageColumn`] can hold. Every primitive
/// column type in spec.md §3 implements this via the blanket impl below;
/// `String` gets its own inherent `impl` block for the string-only scans.
pub trait Cell: Clone + Default + PartialEq + PartialOrd + Send + Sync + 'static {}
impl<T: Clone + Default + PartialEq + PartialOrd + Send + Sync + 'static> Cell for T {}

struct PageData<T> {
    values: Vec<T>,
    present: Vec<bool>,
}

impl<T: Cell> PageData<T> {
    fn new(page_size: usize) -> Self {
        Self {
            values: vec![T::default(); page_size],
            present: vec![false; page_size],
        }
    }
}

type Page<T> = Arc<RwLock<PageData<T>>>;

/// One attribute's storage: `capacity = page_size * max_pages`, materialised
/// lazily up to `initial_pages` eagerly and beyond that on demand.
pub struct PageColumn<T: Cell> {
    page_size: usize,
    max_pages: usize,
    capacity: usize,
    pages: RwLock<Vec<Page<T>>>,
    watermark: AtomicUsize,
}

impl<T: Cell> PageColumn<T> {
    pub fn new(page_size: usize, max_pages: usize, initial_pages: usize) -> Self {
        let mut pages = Vec::with_capacity(initial_pages.max(1));
        for _ in 0..initial_pages {
            pages.push(Arc::new(RwLock::new(PageData::new(page_size))));
        }
        Self {
            page_size,
            max_pages,
            capacity: page_size * max_pages,
            pages: RwLock::new(pages),
            watermark: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `W`: the exclusive upper bound of indices safe to scan (Invariant C1:
    /// never decreases, enforced by `fetch_max`).
    pub fn published_count(&self) -> usize {
        self.watermark.load(Ordering::Acquire)
    }

    /// Advances the watermark to `max(current, new_w)`. The release fence
    /// that makes cells in `[old_w, new_w)` visible to scans (Invariant C2).
    pub fn publish(&self, new_w: usize) {
        self.watermark.fetch_max(new_w, Ordering::Release);
    }

    fn ensure_page(&self, page_id: usize) {
        {
            let pages = self.pages.read();
            if page_id < pages.len() {
                return;
            }
        }
        let mut pages = self.pages.write();
        while pages.len() <= page_id {
            log::debug!("column: materialising page {}", pages.len());
            pages.push(Arc::new(RwLock::new(PageData::new(self.page_size))));
        }
    }

    fn page_for(&self, i: usize) -> (Page<T>, usize) {
        let page_id = i / self.page_size;
        let offset = i % self.page_size;
        self.ensure_page(page_id);
        let page = self.pages.read()[page_id].clone();
        (page, offset)
    }

    /// Writes cell `i`, setting its presence bit. Must be called only while
    /// the row's seqlock is held odd (spec.md §4.1's ordering requirement) —
    /// this type has no opinion about rows, only about its own cells.
    pub fn set(&self, i: usize, v: T) {
        assert!(i < self.capacity, "column row index {i} out of range (capacity {})", self.capacity);
        let (page, offset) = self.page_for(i);
        let mut data = page.write();
        data.values[offset] = v;
        data.present[offset] = true;
    }

    /// Clears presence; value contents are unspecified afterwards.
    pub fn set_null(&self, i: usize) {
        assert!(i < self.capacity, "column row index {i} out of range (capacity {})", self.capacity);
        let page_id = i / self.page_size;
        let pages = self.pages.read();
        if let Some(page) = pages.get(page_id) {
            page.write().present[i % self.page_size] = false;
        }
    }

    /// Type default if unpublished or absent (Invariant C3).
    pub fn get(&self, i: usize) -> T {
        if i >= self.published_count() {
            return T::default();
        }
        let page_id = i / self.page_size;
        let pages = self.pages.read();
        match pages.get(page_id) {
            Some(page) => {
                let data = page.read();
                let offset = i % self.page_size;
                if data.present[offset] {
                    data.values[offset].clone()
                } else {
                    T::default()
                }
            }
            None => T::default(),
        }
    }

    pub fn is_present(&self, i: usize) -> bool {
        if i >= self.published_count() {
            return false;
        }
        let page_id = i / self.page_size;
        let pages = self.pages.read();
        match pages.get(page_id) {
            Some(page) => page.read().present[i % self.page_size],
            None => false,
        }
    }

    fn scan(&self, limit: usize, mut pred: impl FnMut(&T) -> bool) -> Vec<u32> {
        let w = self.published_count().min(limit);
        let mut out = Vec::new();
        let mut start = 0usize;
        let pages = self.pages.read();
        for page in pages.iter() {
            if start >= w {
                break;
            }
            let data = page.read();
            let end = (start + self.page_size).min(w);
            for i in start..end {
                let offset = i - start;
                if data.present[offset] && pred(&data.values[offset]) {
                    out.push(i as u32);
                }
            }
            start += self.page_size;
        }
        out
    }

    pub fn scan_equals(&self, target: &T, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| v == target)
    }

    pub fn scan_gt(&self, target: &T, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| v.partial_cmp(target) == Some(std::cmp::Ordering::Greater))
    }

    pub fn scan_ge(&self, target: &T, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| matches!(v.partial_cmp(target), Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)))
    }

    pub fn scan_lt(&self, target: &T, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| v.partial_cmp(target) == Some(std::cmp::Ordering::Less))
    }

    pub fn scan_le(&self, target: &T, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| matches!(v.partial_cmp(target), Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)))
    }

    /// Inclusive on both bounds; empty when `lo > hi` (spec.md §4.1).
    pub fn scan_between(&self, lo: &T, hi: &T, limit: usize) -> Vec<u32> {
        if lo.partial_cmp(hi) == Some(std::cmp::Ordering::Greater) {
            return Vec::new();
        }
        self.scan(limit, |v| {
            matches!(v.partial_cmp(lo), Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal))
                && matches!(v.partial_cmp(hi), Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal))
        })
    }

    /// Empty input returns empty without scanning (spec.md §4.1, §8 property 10).
    pub fn scan_in(&self, targets: &[T], limit: usize) -> Vec<u32> {
        if targets.is_empty() {
            return Vec::new();
        }
        self.scan(limit, |v| targets.contains(v))
    }
}

impl PageColumn<String> {
    pub fn scan_equals_ignore_case(&self, target: &str, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| v.eq_ignore_ascii_case(target))
    }

    pub fn scan_starts_with(&self, prefix: &str, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| v.starts_with(prefix))
    }

    pub fn scan_ends_with(&self, suffix: &str, limit: usize) -> Vec<u32> {
        self.scan(limit, |v| v.ends_with(suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpublished_reads_as_default() {
        let col: PageColumn<i32> = PageColumn::new(4, 2, 1);
        col.set(0, 42);
        assert_eq!(col.get(0), 0);
        assert!(!col.is_present(0));
        col.publish(1);
        assert_eq!(col.get(0), 42);
        assert!(col.is_present(0));
    }

    #[test]
    fn scan_respects_watermark() {
        let col: PageColumn<i32> = PageColumn::new(4, 4, 1);
        for i in 0..8u32 {
            col.set(i as usize, i as i32);
        }
        col.publish(5);
        let got = col.scan_ge(&0, usize::MAX);
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn between_is_inclusive_and_empty_when_reversed() {
        let col: PageColumn<i32> = PageColumn::new(8, 1, 1);
        for (i, v) in [100, 200, 300].into_iter().enumerate() {
            col.set(i, v);
        }
        col.publish(3);
        assert_eq!(col.scan_between(&150, &250, usize::MAX), vec![1]);
        assert_eq!(col.scan_between(&100, &300, usize::MAX), vec![0, 1, 2]);
        assert_eq!(col.scan_between(&300, &100, usize::MAX), Vec::<u32>::new());
    }

    #[test]
    fn scan_in_empty_targets_short_circuits() {
        let col: PageColumn<i32> = PageColumn::new(4, 1, 1);
        col.set(0, 1);
        col.publish(1);
        assert_eq!(col.scan_in(&[], usize::MAX), Vec::<u32>::new());
    }

    #[test]
    fn string_scans() {
        let col: PageColumn<String> = PageColumn::new(4, 1, 1);
        col.set(0, "Alice".to_string());
        col.set(1, "Bob".to_string());
        col.publish(2);
        assert_eq!(col.scan_starts_with("Al", usize::MAX), vec![0]);
        assert_eq!(col.scan_ends_with("ob", usize::MAX), vec![1]);
        assert_eq!(col.scan_equals_ignore_case("alice", usize::MAX), vec![0]);
    }

    #[test]
    fn tombstone_style_null_hides_from_scans() {
        let col: PageColumn<i32> = PageColumn::new(4, 1, 1);
        col.set(0, 7);
        col.publish(1);
        assert_eq!(col.scan_equals(&7, usize::MAX), vec![0]);
        col.set_null(0);
        assert_eq!(col.scan_equals(&7, usize::MAX), Vec::<u32>::new());
        assert_eq!(col.get(0), 0);
    }
}
