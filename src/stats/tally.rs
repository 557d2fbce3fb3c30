//! Insertion-ordered accumulator keyed by string.

use std::collections::HashMap;

/// Accumulates a value per key and remembers first-seen order, so rankings
/// break ties by encounter order.
#[derive(Debug, Clone)]
pub struct Tally<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Tally<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V: Default> Tally<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to the value for `key`, inserting a default first.
    pub fn entry(&mut self, key: &str) -> &mut V {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.entries.push((key.to_string(), V::default()));
                let slot = self.entries.len() - 1;
                self.index.insert(key.to_string(), slot);
                slot
            }
        };
        &mut self.entries[slot].1
    }
}

impl<V> Tally<V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Entries ordered by `rank` descending (stable), truncated to `limit`.
    pub fn ranked_by<K, F>(self, rank: F, limit: usize) -> Vec<(String, V)>
    where
        K: Ord,
        F: Fn(&V) -> K,
    {
        let mut entries = self.entries;
        entries.sort_by(|a, b| rank(&b.1).cmp(&rank(&a.1)));
        entries.truncate(limit);
        entries
    }
}

impl Tally<u64> {
    pub fn add(&mut self, key: &str, amount: u64) {
        let total = self.entry(key);
        *total = total.saturating_add(amount);
    }

    /// The `limit` largest totals, ties in first-seen order.
    pub fn most_common(&self, limit: usize) -> Vec<(String, u64)> {
        self.clone().ranked_by(|v| *v, limit)
    }
}
