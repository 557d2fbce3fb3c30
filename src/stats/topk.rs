//! Bounded top-K tracker.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Item stored in the heap, ordered by metric and then by the item itself.
#[derive(Debug)]
struct Ranked<T> {
    metric: u64,
    item: T,
}

impl<T: Ord> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Ranked<T> {}

impl<T: Ord> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.metric
            .cmp(&other.metric)
            .then_with(|| self.item.cmp(&other.item))
    }
}

/// Keeps the `capacity` largest `(metric, item)` pairs of a stream.
///
/// Once full, an insert replaces the current minimum only when its metric is
/// strictly greater; among equal metrics the smallest item is evicted first.
#[derive(Debug)]
pub struct TopK<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<Ranked<T>>>,
}

impl<T: Ord> TopK<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Offer an item. Returns whether it was retained.
    pub fn push(&mut self, metric: u64, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let ranked = Ranked { metric, item };
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(ranked));
            return true;
        }
        match self.heap.peek() {
            Some(Reverse(min)) if metric > min.metric => {
                self.heap.pop();
                self.heap.push(Reverse(ranked));
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Smallest retained metric, the bar a new item has to clear once full.
    pub fn min_metric(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(r)| r.metric)
    }

    /// Retained items, largest metric first; equal metrics by item, descending.
    pub fn into_sorted_vec(self) -> Vec<(u64, T)> {
        let mut ranked: Vec<Ranked<T>> = self.heap.into_iter().map(|Reverse(r)| r).collect();
        ranked.sort_by(|a, b| b.cmp(a));
        ranked.into_iter().map(|r| (r.metric, r.item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_k_largest() {
        let mut top = TopK::new(3);
        for (metric, name) in [(5, "e"), (1, "a"), (9, "i"), (3, "c"), (7, "g"), (2, "b")] {
            top.push(metric, name);
        }
        assert_eq!(top.len(), 3);
        assert_eq!(top.into_sorted_vec(), vec![(9, "i"), (7, "g"), (5, "e")]);
    }

    #[test]
    fn holds_all_when_under_capacity() {
        let mut top = TopK::new(10);
        top.push(4, "x");
        top.push(8, "y");
        assert_eq!(top.len(), 2);
        assert_eq!(top.into_sorted_vec(), vec![(8, "y"), (4, "x")]);
    }

    #[test]
    fn equal_metric_does_not_evict() {
        let mut top = TopK::new(2);
        assert!(top.push(5, "first"));
        assert!(top.push(5, "second"));
        assert!(!top.push(5, "third"));
        assert_eq!(top.min_metric(), Some(5));
        assert_eq!(top.into_sorted_vec(), vec![(5, "second"), (5, "first")]);
    }

    #[test]
    fn ties_rank_by_item_descending() {
        let mut top = TopK::new(3);
        for name in ["beta", "alpha", "gamma"] {
            top.push(8, name.to_string());
        }
        // Evicts the smallest item among the minimum metric.
        assert!(top.push(9, "delta".to_string()));
        let kept: Vec<(u64, String)> = top.into_sorted_vec();
        assert_eq!(
            kept,
            vec![
                (9, "delta".to_string()),
                (8, "gamma".to_string()),
                (8, "beta".to_string()),
            ]
        );
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut top = TopK::new(0);
        assert!(!top.push(100, ()));
        assert!(top.is_empty());
    }

    #[test]
    fn matches_full_sort_on_pseudo_random_stream() {
        // Deterministic LCG stream, compared against sorting everything.
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut all = Vec::new();
        let mut top = TopK::new(7);
        for i in 0..500u64 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let metric = (state >> 33) % 1000;
            all.push(metric);
            top.push(metric, i);
        }
        all.sort_unstable_by(|a, b| b.cmp(a));
        let kept: Vec<u64> = top.into_sorted_vec().into_iter().map(|(m, _)| m).collect();
        assert_eq!(kept, all[..7].to_vec());
    }
}
