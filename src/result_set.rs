//! Bounded best-k candidate set used during a single query.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One reported neighbour: the point index and its distance to the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    dist_sq: f64,
    // Insertion order; among equal distances the latest arrival is evicted first.
    seq: u64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.seq.cmp(&other.seq))
    }
}

/// The `k` closest candidates seen so far, as a max-heap on squared distance.
///
/// While fewer than `k` candidates are held the pruning threshold is the upper
/// bound; afterwards it is the worst held distance. Candidates beyond the bound
/// are never admitted.
#[derive(Clone, Debug, Default)]
pub struct KBest {
    k: usize,
    bound_sq: f64,
    heap: BinaryHeap<Candidate>,
    seq: u64,
}

impl KBest {
    pub fn new(k: usize, bound_sq: f64) -> Self {
        let mut best = Self::default();
        best.reset(k, bound_sq);
        best
    }

    /// Empties the set for the next query, keeping the allocation.
    pub fn reset(&mut self, k: usize, bound_sq: f64) {
        self.k = k;
        self.bound_sq = bound_sq;
        self.heap.clear();
        self.heap.reserve(k);
        self.seq = 0;
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// Current squared pruning distance.
    #[inline]
    pub fn threshold(&self) -> f64 {
        match self.heap.peek() {
            Some(worst) if self.is_full() => worst.dist_sq,
            _ => self.bound_sq,
        }
    }

    /// Offers a candidate. Returns true if it was kept.
    ///
    /// When the set is full only a strictly closer candidate evicts the current
    /// worst, so ties keep the earlier arrival.
    #[inline]
    pub fn offer(&mut self, index: usize, dist_sq: f64) -> bool {
        if !(dist_sq <= self.bound_sq) {
            return false;
        }
        if self.is_full() {
            match self.heap.peek() {
                Some(worst) if dist_sq < worst.dist_sq => {
                    self.heap.pop();
                }
                _ => return false,
            }
        }
        self.heap.push(Candidate { dist_sq, seq: self.seq, index });
        self.seq += 1;
        true
    }

    /// Drains the held candidates as `(index, squared distance)` in ascending
    /// distance order, ties by ascending index.
    pub fn drain_sorted(&mut self) -> Vec<(usize, f64)> {
        let mut out: Vec<(usize, f64)> = self.heap.drain().map(|c| (c.index, c.dist_sq)).collect();
        out.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        out
    }

    /// Writes the held candidates into `indices`/`dists_sq` in ascending order and
    /// pads the remaining slots with `missing` and infinity.
    pub(crate) fn drain_into(&mut self, indices: &mut [usize], dists_sq: &mut [f64], missing: usize) {
        let held = self.drain_sorted();
        for (slot, (i, d)) in indices.iter_mut().zip(dists_sq.iter_mut()).enumerate() {
            match held.get(slot) {
                Some(&(index, dist_sq)) => {
                    *i = index;
                    *d = dist_sq;
                }
                None => {
                    *i = missing;
                    *d = f64::INFINITY;
                }
            }
        }
    }
}
