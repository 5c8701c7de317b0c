//! Fixed-size transposition table keyed by Zobrist hash.
//!
//! Buckets hold two entries and are indexed by `key & mask`, with the bucket
//! count rounded up to a power of two. Entries never move between buckets;
//! a third colliding position evicts one of the two residents.

use crate::actions::action::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    pub key: u64,
    pub depth: i16,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Action>,
    /// Iteration tag used to evict older entries on depth ties.
    pub age: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TTStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

type Bucket = [Option<TTEntry>; 2];

/// Largest table size accepted; larger requests are clamped.
pub const MAX_TT_MB: usize = 4096;

/// Power-of-two bucket count for a table of at most `size_mb` megabytes.
fn bucket_count(size_mb: usize) -> usize {
    let bytes = size_mb.min(MAX_TT_MB).saturating_mul(1024 * 1024);
    let bucket_size = std::mem::size_of::<Bucket>().max(1);
    (bytes / bucket_size).max(1).next_power_of_two()
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
    size_mb: usize,
    stats: TTStats,
}

impl TranspositionTable {
    pub fn new_with_mb(size_mb: usize) -> Self {
        let mut tt = Self {
            buckets: Vec::new(),
            mask: 0,
            size_mb,
            stats: TTStats::default(),
        };
        tt.resize_mb(size_mb);
        tt
    }

    /// Reallocate to the next power of two buckets fitting `size_mb`,
    /// clamped to [`MAX_TT_MB`]. Tiny sizes (including zero) degrade to a
    /// single bucket.
    pub fn resize_mb(&mut self, size_mb: usize) {
        let size_mb = size_mb.min(MAX_TT_MB);
        let count = bucket_count(size_mb);

        self.buckets = vec![[None; 2]; count];
        self.mask = count - 1;
        self.size_mb = size_mb;
        self.stats = TTStats::default();
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buckets.fill([None; 2]);
        self.stats = TTStats::default();
    }

    /// Number of buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[inline]
    pub fn size_mb(&self) -> usize {
        self.size_mb
    }

    #[inline]
    pub fn stats(&self) -> TTStats {
        self.stats
    }

    /// Occupied slots, for diagnostics.
    pub fn occupied(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.iter().filter(|e| e.is_some()).count())
            .sum()
    }

    #[inline]
    fn idx(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    pub fn probe(&mut self, key: u64) -> Option<TTEntry> {
        self.stats.probes += 1;
        let idx = self.idx(key);
        let hit = self.buckets[idx]
            .iter()
            .flatten()
            .find(|e| e.key == key)
            .copied();
        if hit.is_some() {
            self.stats.hits += 1;
        }
        hit
    }

    /// Replacement order: the slot already holding `key`, an empty slot, the
    /// shallower slot, and on equal depth the older (smaller age) slot.
    pub fn store(&mut self, entry: TTEntry) {
        self.stats.stores += 1;
        let idx = self.idx(entry.key);
        let bucket = &mut self.buckets[idx];

        let slot = if let Some(i) = bucket
            .iter()
            .position(|e| e.is_some_and(|e| e.key == entry.key))
        {
            i
        } else if let Some(i) = bucket.iter().position(Option::is_none) {
            i
        } else {
            match (bucket[0], bucket[1]) {
                (Some(a), Some(b)) if a.depth == b.depth => usize::from(a.age > b.age),
                (Some(a), Some(b)) => usize::from(a.depth >= b.depth),
                _ => 0,
            }
        };

        bucket[slot] = Some(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::{bucket_count, Bound, TTEntry, TranspositionTable, MAX_TT_MB};
    use crate::actions::action::Action;

    fn entry(key: u64, depth: i16, score: i32, age: u16) -> TTEntry {
        TTEntry {
            key,
            depth,
            score,
            bound: Bound::Exact,
            best_move: Some(Action::pass(0, 0)),
            age,
        }
    }

    #[test]
    fn store_and_probe_round_trip() {
        let mut tt = TranspositionTable::new_with_mb(1);
        let e = entry(123, 5, 42, 1);
        tt.store(e);
        assert_eq!(tt.probe(123), Some(e));
        assert_eq!(tt.probe(124), None);
        assert_eq!(tt.stats().hits, 1);
        assert_eq!(tt.stats().probes, 2);
    }

    #[test]
    fn oversized_requests_are_clamped() {
        assert_eq!(bucket_count(usize::MAX), bucket_count(MAX_TT_MB));
        assert!(bucket_count(MAX_TT_MB) > bucket_count(MAX_TT_MB / 2));
        assert_eq!(bucket_count(0), 1);
    }

    #[test]
    fn bucket_count_is_power_of_two() {
        let tt = TranspositionTable::new_with_mb(1);
        assert!(tt.len().is_power_of_two());
        assert_eq!(tt.size_mb(), 1);
    }

    #[test]
    fn zero_megabytes_degrades_to_one_bucket() {
        let mut tt = TranspositionTable::new_with_mb(0);
        assert_eq!(tt.len(), 1);
        tt.store(entry(5, 1, 7, 1));
        assert_eq!(tt.probe(5).map(|e| e.score), Some(7));
    }

    #[test]
    fn two_way_replacement_prefers_empty_then_shallow_then_old() {
        let mut tt = TranspositionTable::new_with_mb(0);

        tt.store(entry(1, 4, 10, 1));
        tt.store(entry(2, 2, 20, 1));
        assert!(tt.probe(1).is_some());
        assert!(tt.probe(2).is_some());

        // Shallower resident (key 2) is evicted.
        tt.store(entry(3, 3, 30, 2));
        assert!(tt.probe(1).is_some());
        assert!(tt.probe(2).is_none());
        assert!(tt.probe(3).is_some());

        // Depth tie between key 4 (age 3) and key 1 (age 1): the older goes.
        tt.store(entry(4, 4, 40, 3));
        assert!(tt.probe(3).is_none());
        tt.store(entry(5, 4, 50, 4));
        assert!(tt.probe(1).is_none());
        assert!(tt.probe(4).is_some());
        assert!(tt.probe(5).is_some());
    }

    #[test]
    fn same_key_overwrites_in_place() {
        let mut tt = TranspositionTable::new_with_mb(0);
        tt.store(entry(9, 1, 1, 1));
        tt.store(entry(8, 6, 2, 1));
        tt.store(entry(9, 2, 3, 2));
        assert_eq!(tt.occupied(), 2);
        assert_eq!(tt.probe(9).map(|e| e.score), Some(3));
        assert_eq!(tt.probe(8).map(|e| e.score), Some(2));
    }

    #[test]
    fn clear_and_resize_purge_entries() {
        let mut tt = TranspositionTable::new_with_mb(1);
        tt.store(entry(77, 3, 1, 1));
        tt.clear();
        assert!(tt.probe(77).is_none());
        assert_eq!(tt.occupied(), 0);

        tt.store(entry(77, 3, 1, 1));
        tt.resize_mb(2);
        assert!(tt.probe(77).is_none());
        assert_eq!(tt.size_mb(), 2);
    }
}
