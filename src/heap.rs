//! Binary min-heap over `(vertex, distance)` pairs with lazy deletion.
//!
//! There is no decrease-key: a cheaper distance for a vertex is pushed as a fresh
//! entry, leaving the old one in the heap. Callers keep the authoritative best value
//! per vertex themselves and must discard any popped entry that disagrees with it
//! (see [`HeapEntry::is_stale`]). The heap may therefore hold up to `O(m)` entries.

use crate::graph::VertexId;

/// A heap entry: a vertex and the tentative value it was pushed with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeapEntry {
    /// The vertex.
    pub key: VertexId,
    /// Priority (smaller pops first).
    pub value: f64,
}

impl HeapEntry {
    /// Returns `true` if this entry no longer reflects the current best value.
    #[inline(always)]
    pub fn is_stale(&self, best: &[f64]) -> bool {
        self.value != best[self.key]
    }
}

/// Zero-indexed binary min-heap ordered by [`HeapEntry::value`].
#[derive(Clone, Debug, Default)]
pub struct LazyMinHeap {
    entries: Vec<HeapEntry>,
}

impl LazyMinHeap {
    /// Creates an empty heap with room for `capacity` entries; storage doubles when full.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns `true` if no entries (stale or not) remain.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored entries, stale ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts `(key, value)`.
    #[inline]
    pub fn push(&mut self, key: VertexId, value: f64) {
        self.entries.push(HeapEntry { key, value });
        self.sift_up(self.entries.len() - 1);
    }

    /// Removes and returns the entry with the smallest value.
    #[inline]
    pub fn pop(&mut self) -> Option<HeapEntry> {
        let last = self.entries.len().checked_sub(1)?;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        self.sift_down(0);
        min
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[i].value >= self.entries[parent].value {
                break;
            }
            self.entries.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.entries[right].value < self.entries[left].value {
                right
            } else {
                left
            };
            if self.entries[i].value <= self.entries[child].value {
                break;
            }
            self.entries.swap(i, child);
            i = child;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
