use crate::float::Coord;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A data point considered during a search. `pos` is its position in the
/// tree's leaf order, `index` its original index.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate<T> {
    pub dist_sq: T,
    pub index: usize,
    pub pos: usize,
}

impl<T: Coord> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Coord> Eq for Candidate<T> {}

impl<T: Coord> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Coord> Ord for Candidate<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal distances rank by original index.
        self.dist_sq
            .partial_cmp(&other.dist_sq)
            .unwrap_or(Ordering::Equal)
            .then(self.index.cmp(&other.index))
    }
}

/// The `k` best candidates seen so far, kept in a max-heap so the current
/// worst is available in O(1).
#[derive(Clone, Debug, Default)]
pub(crate) struct Candidates<T: Coord> {
    heap: BinaryHeap<Candidate<T>>,
    k: usize,
}

impl<T: Coord> Candidates<T> {
    pub fn reset(&mut self, k: usize) {
        self.heap.clear();
        self.heap.reserve(k);
        self.k = k;
    }

    /// Squared distance a new point must not exceed to be admitted.
    /// Infinite until `k` candidates are held.
    #[inline]
    pub fn worst_dist_sq(&self) -> T {
        if self.heap.len() < self.k {
            T::infinity()
        } else {
            self.heap.peek().map_or(T::infinity(), |c| c.dist_sq)
        }
    }

    #[inline]
    pub fn offer(&mut self, candidate: Candidate<T>) {
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    /// Empties the collection, returning its contents in ascending order.
    /// The heap keeps its allocation for the next search.
    pub fn drain_sorted(&mut self) -> Vec<Candidate<T>> {
        let mut sorted: Vec<_> = self.heap.drain().collect();
        sorted.sort_unstable();
        sorted
    }
}
