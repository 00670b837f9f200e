//! Fixed-capacity FIFO ring.
//!
//! `CircularBuffer` never grows and never blocks: `put` on a full ring hands
//! the item back instead of overwriting. Cross-thread users wrap it in a
//! mutex; the ring itself is single-threaded.

use std::collections::VecDeque;

/// Bounded FIFO with non-blocking put/get and head peeking.
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    /// Create a ring holding at most `capacity` items.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CircularBuffer capacity must be non-zero");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item` at the tail, or return it if the ring is full.
    pub fn put(&mut self, item: T) -> Result<(), T> {
        if self.at_capacity() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Remove and return the head.
    pub fn get(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Borrow the head without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Remove the head only if `accept` approves of it.
    ///
    /// The check and the removal happen under the same borrow, so a shared
    /// ring behind a mutex can do "peek then pop" without a window between.
    pub fn get_if(&mut self, accept: impl FnOnce(&T) -> bool) -> Option<T> {
        match self.items.front() {
            Some(head) if accept(head) => self.items.pop_front(),
            _ => None,
        }
    }

    pub fn at_capacity(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots left.
    pub fn remaining(&self) -> usize {
        self.capacity - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop the newest `n` items, undoing the last `n` puts.
    pub fn truncate_back(&mut self, n: usize) {
        let keep = self.items.len().saturating_sub(n);
        self.items.truncate(keep);
    }
}

impl<T: Copy> CircularBuffer<T> {
    /// Append every item of `items`, all or nothing.
    ///
    /// Returns `false` (and stores nothing) when the ring lacks room for the
    /// whole slice.
    pub fn put_slice(&mut self, items: &[T]) -> bool {
        if items.len() > self.remaining() {
            return false;
        }
        self.items.extend(items.iter().copied());
        true
    }

    /// Move up to `max` items from the head into `out`, returning how many.
    pub fn drain_into(&mut self, out: &mut Vec<T>, max: usize) -> usize {
        let n = max.min(self.items.len());
        out.extend(self.items.drain(..n));
        n
    }
}
