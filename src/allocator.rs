//! Mints row identities, maintains the free list of tombstoned slots, and
//! owns the per-row generation/seqlock words (spec.md §4.2). One mutex
//! guards the free list and the high-water mark together so `allocate` and
//! `deallocate` are linearizable, per spec.md §4.2's "practical realisation."
//! A treiber stack would shave the uncontended fast path, but table inserts
//! already take this lock briefly and release it before touching any
//! column — contention here is not the bottleneck the seqlock exists to
//! avoid.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Result, RowStoreError};
use crate::seqlock::SeqGen;

struct AllocState {
    free_list: Vec<u32>,
}

pub struct RowAllocator {
    capacity: u32,
    page_size: usize,
    max_pages: usize,
    allocated_count: AtomicU32,
    state: Mutex<AllocState>,
    seqgen: Vec<SeqGen>,
}

impl RowAllocator {
    pub fn new(page_size: usize, max_pages: usize) -> Self {
        let capacity = (page_size * max_pages) as u32;
        let mut seqgen = Vec::with_capacity(capacity as usize);
        seqgen.resize_with(capacity as usize, SeqGen::new);
        Self {
            capacity,
            page_size,
            max_pages,
            allocated_count: AtomicU32::new(0),
            state: Mutex::new(AllocState { free_list: Vec::new() }),
            seqgen,
        }
    }

    pub fn seq(&self, row_index: u32) -> &SeqGen {
        &self.seqgen[row_index as usize]
    }

    pub fn generation(&self, row_index: u32) -> u32 {
        self.seq(row_index).generation()
    }

    pub fn allocated_count(&self) -> u32 {
        self.allocated_count.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns `(row_index, generation)`. The generation is already the
    /// post-reuse value for recycled slots, matching spec.md §4.2: "On
    /// reuse, increment that slot's generation."
    pub fn allocate(&self) -> Result<(u32, u32)> {
        let mut state = self.state.lock();
        if let Some(row_index) = state.free_list.pop() {
            let generation = self.seq(row_index).reuse_bump_generation();
            log::trace!("allocator: reused row {row_index}, generation {generation}");
            return Ok((row_index, generation));
        }
        let row_index = self.allocated_count.load(Ordering::Acquire);
        if row_index >= self.capacity {
            log::warn!(
                "allocator: capacity exhausted at {} rows (page_size={}, max_pages={})",
                self.capacity, self.page_size, self.max_pages
            );
            return Err(RowStoreError::CapacityExhausted {
                page_size: self.page_size,
                max_pages: self.max_pages,
            });
        }
        self.allocated_count.store(row_index + 1, Ordering::Release);
        let generation = self.seq(row_index).generation();
        Ok((row_index, generation))
    }

    pub fn deallocate(&self, row_index: u32) {
        let mut state = self.state.lock();
        state.free_list.push(row_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn allocate_fills_high_water_then_errors() {
        let alloc = RowAllocator::new(2, 1);
        assert_eq!(alloc.allocate().unwrap().0, 0);
        assert_eq!(alloc.allocate().unwrap().0, 1);
        assert!(matches!(alloc.allocate(), Err(RowStoreError::CapacityExhausted { .. })));
    }

    #[test]
    fn reuse_bumps_generation() {
        let alloc = RowAllocator::new(4, 1);
        let (row, gen0) = alloc.allocate().unwrap();
        assert_eq!(gen0, 0);
        alloc.deallocate(row);
        let (row2, gen1) = alloc.allocate().unwrap();
        assert_eq!(row2, row);
        assert_eq!(gen1, 1);
    }

    #[test]
    fn concurrent_allocate_never_hands_out_duplicates() {
        let alloc = Arc::new(RowAllocator::new(1000, 1));
        let mut handles = vec![];
        for _ in 0..8 {
            let alloc = alloc.clone();
            handles.push(thread::spawn(move || {
                let mut got = Vec::new();
                for _ in 0..100 {
                    got.push(alloc.allocate().unwrap().0);
                }
                got
            }));
        }
        let mut all = HashSet::new();
        for h in handles {
            for row in h.join().unwrap() {
                assert!(all.insert(row), "row {row} allocated twice concurrently");
            }
        }
        assert_eq!(all.len(), 800);
    }
}
