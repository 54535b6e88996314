//! Transposition table with least-recently-used eviction

use crate::sim::score::Score;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// How a stored score bounds the true value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

/// A cached evaluation at some search depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub score: Score,
    pub depth: u32,
    pub bound: Bound,
}

/// Maps position hash to the best evaluation seen for it
///
/// Fixed capacity with LRU eviction. Store policy: insert when absent, or
/// when the new entry was searched at least as deep as the stored one.
/// Probe policy: an entry only answers queries at its depth or shallower.
#[derive(Debug)]
pub struct TranspositionTable {
    entries: FxHashMap<u64, TtEntry>,
    /// Recency queue, least recent at the front; may hold stale duplicates
    /// that are skipped during eviction
    recency: VecDeque<u64>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl TranspositionTable {
    pub const DEFAULT_CAPACITY: usize = 100_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TranspositionTable {
            entries: FxHashMap::default(),
            recency: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a position for a query at the given depth
    pub fn probe(&mut self, hash: u64, depth: u32) -> Option<TtEntry> {
        match self.entries.get(&hash) {
            Some(entry) if entry.depth >= depth => {
                let entry = *entry;
                self.touch(hash);
                self.hits += 1;
                Some(entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store an evaluation; shallower results never overwrite deeper ones
    pub fn store(&mut self, hash: u64, score: Score, depth: u32, bound: Bound) {
        if let Some(existing) = self.entries.get(&hash) {
            if depth < existing.depth {
                return;
            }
        } else if self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        self.entries.insert(hash, TtEntry { score, depth, bound });
        self.touch(hash);
    }

    fn touch(&mut self, hash: u64) {
        self.recency.push_back(hash);
        // Bound the queue so stale duplicates cannot grow without limit
        if self.recency.len() > 4 * self.capacity {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let mut seen = FxHashMap::default();
        // Keep only the most recent occurrence of each hash
        let mut fresh: Vec<u64> = Vec::with_capacity(self.entries.len());
        for &hash in self.recency.iter().rev() {
            if self.entries.contains_key(&hash) && seen.insert(hash, ()).is_none() {
                fresh.push(hash);
            }
        }
        fresh.reverse();
        self.recency = fresh.into();
    }

    fn evict_lru(&mut self) {
        while let Some(hash) = self.recency.pop_front() {
            // Skip stale queue entries: only evict if this is the hash's
            // oldest remaining occurrence
            if self.recency.contains(&hash) {
                continue;
            }
            if self.entries.remove(&hash).is_some() {
                return;
            }
        }
        // Queue exhausted; drop an arbitrary entry to make room
        if let Some(&hash) = self.entries.keys().next() {
            self.entries.remove(&hash);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
