//! Recycling pool for the decode path.
//!
//! Decoding one lookup allocates a symbol buffer and one record per target
//! phrase. [`RecordPool`] keeps released objects on free lists and hands them
//! back, reset, on the next acquire.
//!
//! Objects are lent out as [`Pooled`] guards. Dropping a guard (or calling
//! [`Pooled::release`]) returns the object; ownership rules out use after
//! release and double release. A pool uses `RefCell` internally and is not
//! `Sync`: give each thread its own pool.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::decoder::DecodedRecord;

/// Default bound on each free list.
pub const DEFAULT_POOL_LIMIT: usize = 1024;

/// An object that can be cleared for reuse without freeing its allocations.
pub trait Recycle: Default {
    fn reset(&mut self);
}

impl Recycle for Vec<u32> {
    fn reset(&mut self) {
        self.clear();
    }
}

struct FreeList<T> {
    items: RefCell<Vec<T>>,
    allocated: Cell<usize>,
}

impl<T: Recycle> FreeList<T> {
    fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            allocated: Cell::new(0),
        }
    }

    fn take(&self) -> T {
        match self.items.borrow_mut().pop() {
            Some(mut item) => {
                item.reset();
                item
            }
            None => {
                self.allocated.set(self.allocated.get() + 1);
                T::default()
            }
        }
    }

    fn give_back(&self, item: T, limit: usize) {
        let mut items = self.items.borrow_mut();
        if items.len() < limit {
            items.push(item);
        }
    }

    fn len(&self) -> usize {
        self.items.borrow().len()
    }
}

/// Free lists of decoded records and symbol buffers.
pub struct RecordPool {
    records: FreeList<DecodedRecord>,
    streams: FreeList<Vec<u32>>,
    limit: usize,
}

impl RecordPool {
    pub fn new() -> Self {
        Self::with_capacity_limit(DEFAULT_POOL_LIMIT)
    }

    /// Creates a pool whose free lists each hold at most `limit` objects;
    /// objects released beyond that are dropped.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            records: FreeList::new(),
            streams: FreeList::new(),
            limit,
        }
    }

    /// Pops a reset record from the free list, or allocates one.
    pub fn acquire_record(&self) -> Pooled<'_, DecodedRecord> {
        Pooled::new(self.records.take(), &self.records, self.limit)
    }

    /// Pops an empty symbol buffer from the free list, or allocates one.
    pub fn acquire_stream(&self) -> Pooled<'_, Vec<u32>> {
        Pooled::new(self.streams.take(), &self.streams, self.limit)
    }

    /// Records currently waiting on the free list.
    pub fn free_records(&self) -> usize {
        self.records.len()
    }

    /// Symbol buffers currently waiting on the free list.
    pub fn free_streams(&self) -> usize {
        self.streams.len()
    }

    /// Records allocated fresh because the free list was empty.
    pub fn records_allocated(&self) -> usize {
        self.records.allocated.get()
    }

    /// Symbol buffers allocated fresh because the free list was empty.
    pub fn streams_allocated(&self) -> usize {
        self.streams.allocated.get()
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordPool")
            .field("free_records", &self.free_records())
            .field("free_streams", &self.free_streams())
            .field("limit", &self.limit)
            .finish()
    }
}

/// An object on loan from a [`RecordPool`]. Returned to the pool on drop.
pub struct Pooled<'p, T: Recycle> {
    item: Option<T>,
    home: &'p FreeList<T>,
    limit: usize,
}

impl<'p, T: Recycle> Pooled<'p, T> {
    fn new(item: T, home: &'p FreeList<T>, limit: usize) -> Self {
        Self {
            item: Some(item),
            home,
            limit,
        }
    }

    /// Returns the object to its pool now.
    pub fn release(self) {}

    /// Takes the object out of the pool's custody. It will not be recycled.
    pub fn detach(mut self) -> T {
        self.item.take().unwrap_or_default()
    }
}

impl<T: Recycle> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("pooled object used after detach"),
        }
    }
}

impl<T: Recycle> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(item) => item,
            None => unreachable!("pooled object used after detach"),
        }
    }
}

impl<T: Recycle> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.home.give_back(item, self.limit);
        }
    }
}

impl<T: Recycle + fmt::Debug> fmt::Debug for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_then_acquire_reuses() {
        let pool = RecordPool::new();
        let mut r = pool.acquire_record();
        r.prob.push(1.0);
        r.counts.extend_from_slice(b"abc");
        r.release();

        assert_eq!(pool.free_records(), 1);
        let r = pool.acquire_record();
        assert_eq!(pool.free_records(), 0);
        assert_eq!(pool.records_allocated(), 1);
        assert!(r.prob.is_empty());
        assert!(r.counts.is_empty());
        assert!(r.counts.capacity() >= 3);
    }

    #[test]
    fn drop_returns_to_pool() {
        let pool = RecordPool::new();
        {
            let _a = pool.acquire_stream();
            let _b = pool.acquire_stream();
        }
        assert_eq!(pool.free_streams(), 2);
        assert_eq!(pool.streams_allocated(), 2);

        let mut s = pool.acquire_stream();
        s.push(7);
        drop(s);
        let s = pool.acquire_stream();
        assert!(s.is_empty());
        assert_eq!(pool.streams_allocated(), 2);
    }

    #[test]
    fn detach_is_not_recycled() {
        let pool = RecordPool::new();
        let mut r = pool.acquire_record();
        r.prob.push(0.5);
        let owned = r.detach();
        assert_eq!(owned.prob, vec![0.5]);
        assert_eq!(pool.free_records(), 0);
    }

    #[test]
    fn limit_bounds_free_list() {
        let pool = RecordPool::with_capacity_limit(1);
        let a = pool.acquire_record();
        let b = pool.acquire_record();
        drop(a);
        drop(b);
        assert_eq!(pool.free_records(), 1);
    }

    #[test]
    fn many_outstanding_guards() {
        let pool = RecordPool::new();
        let held: Vec<_> = (0..10).map(|_| pool.acquire_record()).collect();
        assert_eq!(pool.records_allocated(), 10);
        drop(held);
        assert_eq!(pool.free_records(), 10);
    }
}
