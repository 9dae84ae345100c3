//! Bounded LRU (Least Recently Used) cache with O(1) operations.
//!
//! Uses a HashMap for key→[`Handle`] lookup and a [`RecencyList`] arena for
//! recency ordering. All get/put/remove operations are O(1) amortized.
//! No unsafe code — the list links slots by index instead of raw pointers.
//!
//! This is the single-threaded controller. The thread-safe backends in
//! [`crate::shared`] wrap it (or its parts) behind locks.
//!
//! # Features
//! - O(1) get, put, remove, peek
//! - Fixed capacity with automatic LRU eviction
//! - Hit/miss/eviction statistics
//! - Iterators (MRU→LRU and LRU→MRU order)
//!
//! # Example
//! ```
//! use recall_core::lru_cache::LruCache;
//!
//! let mut cache = LruCache::new(3);
//! cache.put(1, "one");
//! cache.put(2, "two");
//! cache.put(3, "three");
//!
//! assert_eq!(cache.get(&1), Some(&"one"));
//! // 1 is now most-recently used, 2 is least-recently used
//!
//! cache.put(4, "four"); // evicts key=2 (LRU)
//! assert!(!cache.contains(&2));
//! assert_eq!(cache.keys(), vec![4, 1, 3]);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::recency_list::{Handle, Iter, RecencyList};

/// Upper bound on slots reserved up front; larger caches grow on demand.
pub(crate) const MAX_PREALLOC: usize = 4096;

/// Cache hit/miss/eviction statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub insertions: u64,
    pub updates: u64,
    pub removals: u64,
}

impl CacheStats {
    /// Hit rate as a fraction [0.0, 1.0]. Returns 0.0 if no lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of get() calls (hits + misses).
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Bounded LRU cache with O(1) operations.
///
/// The recency list owns every entry; the index maps each key to the
/// entry's [`Handle`] only. Head = most recent, tail = least recent.
pub struct LruCache<K, V> {
    /// Maximum number of entries. Fixed at construction.
    capacity: usize,
    /// Key → list handle.
    map: HashMap<K, Handle>,
    /// Entries in recency order.
    list: RecencyList<K, V>,
    /// Cache statistics.
    stats: CacheStats,
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.list.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Create a new LRU cache with the given maximum capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LruCache capacity must be > 0");
        Self::with_checked_capacity(capacity)
    }

    /// Fallible constructor for capacities that come from configuration.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { capacity });
        }
        Ok(Self::with_checked_capacity(capacity))
    }

    fn with_checked_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::with_capacity(capacity.min(MAX_PREALLOC)),
            list: RecencyList::with_capacity(capacity.min(MAX_PREALLOC)),
            stats: CacheStats::default(),
        }
    }

    /// Returns the maximum capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of entries currently stored.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns a reference to the cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Resets the statistics counters.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Get a reference to the value for `key`, promoting it to most-recently used.
    /// Returns `None` if the key is not present.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let handle = self.touch(key)?;
        self.list.get(handle)
    }

    /// Get a mutable reference to the value for `key`, promoting it to most-recently used.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let handle = self.touch(key)?;
        self.list.get_mut(handle)
    }

    /// Peek at the value for `key` without promoting it (no recency change).
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key).and_then(|&handle| self.list.get(handle))
    }

    /// Returns true if the cache contains the given key (without promoting it).
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or update a key-value pair.
    ///
    /// An existing key has its value replaced and is promoted to
    /// most-recently used; nothing is evicted, even at capacity. A new key
    /// evicts the least-recently used entry first if the cache is full, and
    /// that entry is returned as `Some((evicted_key, evicted_value))`.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&handle) = self.map.get(&key) {
            if let Some(slot) = self.list.get_mut(handle) {
                *slot = value;
                self.list.move_to_front(handle);
                self.stats.updates += 1;
                return None;
            }
            debug_assert!(false, "index holds a dangling handle");
        }

        // New entry — may need to evict
        let evicted = if self.list.len() >= self.capacity {
            self.evict_tail()
        } else {
            None
        };

        let handle = self.list.push_front(key.clone(), value);
        self.map.insert(key, handle);
        self.stats.insertions += 1;
        debug_assert_eq!(self.map.len(), self.list.len());

        evicted
    }

    /// Remove a key from the cache, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let handle = self.map.remove(key)?;
        let (_, value) = self.list.remove(handle)?;
        self.stats.removals += 1;
        debug_assert_eq!(self.map.len(), self.list.len());
        Some(value)
    }

    /// Peek at the least-recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.back()
    }

    /// Peek at the most-recently used entry without removing it.
    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        self.list.front()
    }

    /// Remove and return the least-recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        self.evict_tail()
    }

    /// Clear all entries. Statistics are kept.
    pub fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }

    /// Snapshot of resident keys, most-recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.list.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Iterate over entries from most-recently used to least-recently used.
    pub fn iter_mru(&self) -> Iter<'_, K, V> {
        self.list.iter()
    }

    /// Iterate over entries from least-recently used to most-recently used.
    pub fn iter_lru(&self) -> Iter<'_, K, V> {
        self.list.iter_rev()
    }

    /// Retain only entries for which the predicate returns true.
    /// Entries are visited in LRU→MRU order. Removed entries don't count as evictions.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        // Collect keys to remove (can't mutate while iterating)
        let keys_to_remove: Vec<K> = self
            .iter_lru()
            .filter(|(k, v)| !f(k, v))
            .map(|(k, _)| k.clone())
            .collect();

        for key in keys_to_remove {
            self.remove(&key);
        }
    }

    /// Look up `key` and promote it, recording a hit or miss.
    fn touch(&mut self, key: &K) -> Option<Handle> {
        if let Some(&handle) = self.map.get(key) {
            let moved = self.list.move_to_front(handle);
            debug_assert!(moved, "index holds a dangling handle");
            self.stats.hits += 1;
            Some(handle)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Evict the tail (least-recently used) entry.
    fn evict_tail(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.remove_back()?;
        self.map.remove(&key);
        self.stats.evictions += 1;
        tracing::trace!(
            capacity = self.capacity,
            len = self.list.len(),
            "evicted least-recently used entry"
        );
        Some((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cache holding keys `1..=capacity`, with key 1 least recent.
    fn filled(capacity: usize) -> LruCache<u32, String> {
        let mut cache = LruCache::new(capacity);
        for k in 1..=capacity as u32 {
            cache.put(k, format!("v{k}"));
        }
        cache
    }

    fn handle_of(cache: &LruCache<u32, String>, key: u32) -> Handle {
        cache.map[&key]
    }

    #[test]
    fn get_then_overflow_evicts_second_oldest() {
        let mut cache = filled(3);
        assert_eq!(cache.get(&1).map(String::as_str), Some("v1"));

        assert_eq!(cache.put(4, "v4".into()), Some((2, "v2".into())));
        assert!(!cache.contains(&2));
        assert_eq!(cache.keys(), vec![4, 1, 3]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn unread_keys_leave_in_insertion_order() {
        let mut cache = LruCache::new(2);
        let evicted: Vec<u32> = (1..=6)
            .filter_map(|k| cache.put(k, ()))
            .map(|(k, ())| k)
            .collect();

        assert_eq!(evicted, vec![1, 2, 3, 4]);
        assert_eq!(cache.stats().evictions, 4);
        assert_eq!(cache.stats().insertions, 6);
    }

    #[test]
    fn single_slot_cache() {
        let mut cache = LruCache::new(1);
        cache.put("a", 1);
        assert_eq!(cache.put("b", 2), Some(("a", 1)));
        assert_eq!(cache.put("b", 3), None);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.peek_mru(), Some((&"b", &3)));
    }

    #[test]
    fn resident_put_keeps_its_handle_and_evicts_nothing() {
        let mut cache = filled(3);
        let before = handle_of(&cache, 2);

        assert_eq!(cache.put(2, "fresh".into()), None);
        assert_eq!(handle_of(&cache, 2), before);
        assert_eq!(cache.keys(), vec![2, 3, 1]);
        assert_eq!(cache.peek(&2).map(String::as_str), Some("fresh"));
        assert_eq!(cache.stats().updates, 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn get_mut_writes_through_and_promotes() {
        let mut cache = filled(3);
        if let Some(v) = cache.get_mut(&1) {
            v.push('!');
        }
        assert_eq!(cache.keys()[0], 1);
        assert_eq!(cache.peek(&1).map(String::as_str), Some("v1!"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn misses_only_bump_the_counter() {
        let mut cache = filled(2);
        let before = cache.keys();

        assert!(cache.get(&9).is_none());
        assert!(cache.get_mut(&9).is_none());
        assert_eq!(cache.keys(), before);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn peek_and_contains_are_invisible() {
        let mut cache = filled(3);
        assert!(cache.peek(&1).is_some());
        assert!(cache.contains(&1));
        assert!(cache.peek(&7).is_none());

        assert_eq!(cache.keys(), vec![3, 2, 1]);
        assert_eq!(cache.stats().total_lookups(), 0);
        // 1 was only peeked, so it is still the eviction victim.
        assert_eq!(cache.put(4, "v4".into()).map(|(k, _)| k), Some(1));
    }

    #[test]
    fn remove_invalidates_handle_and_recycles_slot() {
        let mut cache = filled(3);
        let gone = handle_of(&cache, 2);

        assert_eq!(cache.remove(&2).as_deref(), Some("v2"));
        assert!(!cache.list.contains(gone));

        cache.put(9, "v9".into());
        assert_eq!(cache.list.arena_len(), 3);
        assert_ne!(handle_of(&cache, 9), gone);
        assert_eq!(cache.list.get(gone), None);
        assert_eq!(cache.keys(), vec![9, 3, 1]);
        assert_eq!(cache.stats().removals, 1);
    }

    #[test]
    fn removing_an_absent_key_is_a_noop() {
        let mut cache = filled(2);
        assert_eq!(cache.remove(&42), None);
        assert_eq!(cache.remove(&42), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().removals, 0);
    }

    #[test]
    fn clear_invalidates_handles_and_keeps_counters() {
        let mut cache = filled(3);
        cache.get(&1);
        let old: Vec<Handle> = (1..=3).map(|k| handle_of(&cache, k)).collect();

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
        assert!(old.iter().all(|&h| !cache.list.contains(h)));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().insertions, 3);
        assert_eq!(cache.capacity(), 3);

        for k in 1..=3 {
            cache.put(k, String::new());
        }
        assert_eq!(cache.list.arena_len(), 3);
        for k in 1..=3 {
            assert!(!old.contains(&handle_of(&cache, k)));
        }
        assert_eq!(cache.put(4, String::new()).map(|(k, _)| k), Some(1));
    }

    #[test]
    fn eviction_churn_stays_in_a_fixed_arena() {
        let mut cache = LruCache::new(8);
        for k in 0..10_000u32 {
            cache.put(k, k);
        }
        assert_eq!(cache.list.arena_len(), 8);
        assert_eq!(cache.keys(), (9_992..10_000).rev().collect::<Vec<_>>());
        assert_eq!(cache.stats().evictions, 9_992);
    }

    #[test]
    fn pop_lru_drains_oldest_first_and_counts_evictions() {
        let mut cache = filled(2);
        assert_eq!(cache.pop_lru(), Some((1, "v1".into())));
        assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(2));
        assert_eq!(cache.pop_lru().map(|(k, _)| k), Some(2));
        assert_eq!(cache.pop_lru(), None);
        assert_eq!(cache.stats().evictions, 2);
        assert_eq!(cache.peek_mru(), None);
    }

    #[test]
    fn retain_counts_drops_as_removals() {
        let mut cache = filled(6);
        cache.retain(|k, _| k % 3 != 0);

        assert_eq!(cache.keys(), vec![5, 4, 2, 1]);
        assert_eq!(cache.stats().removals, 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn iterators_run_opposite_ways_with_exact_len() {
        let mut cache = filled(4);
        cache.get(&2);

        let mru: Vec<u32> = cache.iter_mru().map(|(k, _)| *k).collect();
        let lru: Vec<u32> = cache.iter_lru().map(|(k, _)| *k).collect();
        assert_eq!(mru, vec![2, 4, 3, 1]);
        assert_eq!(lru, vec![1, 3, 4, 2]);

        let mut it = cache.iter_mru();
        assert_eq!(it.len(), 4);
        it.next();
        assert_eq!(it.size_hint(), (3, Some(3)));
    }

    #[test]
    fn reset_stats_leaves_entries() {
        let mut cache = filled(2);
        cache.get(&1);
        cache.get(&5);
        cache.reset_stats();

        assert_eq!(*cache.stats(), CacheStats::default());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        assert!(CacheStats::default().hit_rate().abs() < f64::EPSILON);

        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(stats.total_lookups(), 4);
    }

    #[test]
    fn stats_serialize_by_field_name() {
        let mut cache = filled(1);
        cache.put(2, String::new());
        let json = serde_json::to_value(cache.stats()).unwrap();
        assert_eq!(json["evictions"], 1);
        assert_eq!(json["insertions"], 2);
    }

    #[test]
    fn huge_capacity_allocates_lazily() {
        let mut cache = LruCache::new(usize::MAX);
        cache.put(1u64, 1u64);
        assert_eq!(cache.list.arena_len(), 1);
        assert_eq!(cache.capacity(), usize::MAX);
    }

    #[test]
    fn try_new_rejects_zero_capacity() {
        let err = LruCache::<u8, u8>::try_new(0).unwrap_err();
        assert_eq!(err, ConfigError::InvalidCapacity { capacity: 0 });
        assert!(LruCache::<u8, u8>::try_new(1).is_ok());
    }

    #[test]
    #[should_panic(expected = "LruCache capacity must be > 0")]
    fn new_panics_on_zero_capacity() {
        let _ = LruCache::<u8, u8>::new(0);
    }
}
