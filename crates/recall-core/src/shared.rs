//! Thread-safe LRU caches.
//!
//! Two interchangeable backends sit behind [`ConcurrentCache`]:
//!
//! - [`LockedLruCache`]: one `RwLock` around a [`LruCache`]. Lookups that
//!   reorder (`get`) need the write lock; `peek`, `contains`, `len`, `keys`
//!   and `stats` share the read lock. Linearizable.
//! - [`SplitLruCache`]: a sharded key index ([`ShardedMap`]) in front of a
//!   mutex-guarded [`RecencyList`]. `contains` never touches the list.
//!   Every index mutation happens while the list mutex is held, so the two
//!   structures agree at the end of each critical section.
//!
//! Lock order in the split backend is always list → shard. `get` and `peek`
//! read the index first, but the shard guard is dropped before the list
//! mutex is taken, so no thread ever waits on the list while holding a shard.
//!
//! [`SharedCache`] picks a backend at construction time (see
//! [`crate::config::CacheConfig::build`]).

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::concurrent_map::{DEFAULT_SHARDS, DistributionStats, ShardedMap};
use crate::config::Backend;
use crate::error::ConfigError;
use crate::lru_cache::{CacheStats, LruCache, MAX_PREALLOC};
use crate::recency_list::{Handle, RecencyList};

/// A bounded LRU cache usable from many threads through `&self`.
///
/// Values are returned by clone: no borrow may outlive the internal lock.
pub trait ConcurrentCache<K, V>: Send + Sync {
    /// Insert or update. Returns the evicted entry, if any.
    fn put(&self, key: K, value: V) -> Option<(K, V)>;

    /// Look up and mark as most-recently used.
    fn get(&self, key: &K) -> Option<V>;

    /// Look up without touching recency order.
    fn peek(&self, key: &K) -> Option<V>;

    /// Membership test without touching recency order.
    fn contains(&self, key: &K) -> bool;

    /// Remove an entry. `Some` iff the key was present.
    fn remove(&self, key: &K) -> Option<V>;

    /// Drop every entry. Statistics are kept.
    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Snapshot of keys, most-recent first.
    fn keys(&self) -> Vec<K>;

    fn stats(&self) -> CacheStats;

    fn backend(&self) -> Backend;
}

// =============================================================================
// LockedLruCache
// =============================================================================

/// An [`LruCache`] behind a single reader-writer lock.
pub struct LockedLruCache<K, V> {
    capacity: usize,
    inner: RwLock<LruCache<K, V>>,
}

impl<K, V> std::fmt::Debug for LockedLruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedLruCache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, V> LockedLruCache<K, V> {
    /// Create a locked cache.
    ///
    /// # Panics
    /// Panics if `capacity` is 0. Use [`Self::try_new`] to get an error instead.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self::from_cache(LruCache::new(capacity))
    }

    /// Create a locked cache, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        LruCache::try_new(capacity).map(Self::from_cache)
    }

    fn from_cache(cache: LruCache<K, V>) -> Self {
        let capacity = cache.capacity();
        tracing::debug!(capacity, backend = "locked", "created shared cache");
        Self {
            capacity,
            inner: RwLock::new(cache),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<K, V>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruCache<K, V>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Zero all statistics counters.
    pub fn reset_stats(&self) {
        self.write().reset_stats();
    }
}

impl<K, V> ConcurrentCache<K, V> for LockedLruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> Option<(K, V)> {
        self.write().put(key, value)
    }

    fn get(&self, key: &K) -> Option<V> {
        self.write().get(key).cloned()
    }

    fn peek(&self, key: &K) -> Option<V> {
        self.read().peek(key).cloned()
    }

    fn contains(&self, key: &K) -> bool {
        self.read().contains(key)
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.write().remove(key)
    }

    fn clear(&self) {
        self.write().clear();
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn keys(&self) -> Vec<K> {
        self.read().keys()
    }

    fn stats(&self) -> CacheStats {
        self.read().stats().clone()
    }

    fn backend(&self) -> Backend {
        Backend::Locked
    }
}

// =============================================================================
// SplitLruCache
// =============================================================================

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    insertions: AtomicU64,
    updates: AtomicU64,
    removals: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.insertions,
            &self.updates,
            &self.removals,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// LRU cache with a sharded key index and a separately locked recency list.
pub struct SplitLruCache<K, V> {
    capacity: usize,
    index: ShardedMap<K, Handle>,
    list: Mutex<RecencyList<K, V>>,
    counters: Counters,
}

impl<K, V> std::fmt::Debug for SplitLruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitLruCache")
            .field("capacity", &self.capacity)
            .field("index_shards", &self.index.shard_count())
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, V> SplitLruCache<K, V> {
    /// Create a split cache with the default index shard count.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self::build(capacity, DEFAULT_SHARDS)
    }

    /// Create a split cache, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        Self::try_with_shards(capacity, DEFAULT_SHARDS)
    }

    /// Create with an explicit index shard count (clamped to `[1, 256]`).
    pub fn try_with_shards(capacity: usize, shards: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { capacity });
        }
        Ok(Self::build(capacity, shards))
    }

    fn build(capacity: usize, shards: usize) -> Self {
        let index = ShardedMap::with_shards(shards);
        tracing::debug!(
            capacity,
            backend = "split",
            index_shards = index.shard_count(),
            "created shared cache"
        );
        Self {
            capacity,
            index,
            list: Mutex::new(RecencyList::with_capacity(capacity.min(MAX_PREALLOC))),
            counters: Counters::default(),
        }
    }

    fn lock_list(&self) -> MutexGuard<'_, RecencyList<K, V>> {
        self.list.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// How evenly resident keys spread over the index shards.
    pub fn index_distribution(&self) -> DistributionStats {
        DistributionStats::from_shard_sizes(&self.index.shard_sizes())
    }

    /// Zero all statistics counters.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}

impl<K, V> ConcurrentCache<K, V> for SplitLruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> Option<(K, V)> {
        let mut list = self.lock_list();

        if let Some(handle) = self.index.get(&key) {
            if let Some(slot) = list.get_mut(handle) {
                *slot = value;
                list.move_to_front(handle);
                Counters::bump(&self.counters.updates);
                return None;
            }
            debug_assert!(false, "index holds a dangling handle");
        }

        let evicted = if list.len() >= self.capacity {
            list.remove_back().map(|(old_key, old_value)| {
                self.index.remove(&old_key);
                Counters::bump(&self.counters.evictions);
                tracing::trace!(capacity = self.capacity, "evicted least-recently used entry");
                (old_key, old_value)
            })
        } else {
            None
        };

        let handle = list.push_front(key.clone(), value);
        self.index.insert(key, handle);
        Counters::bump(&self.counters.insertions);
        evicted
    }

    fn get(&self, key: &K) -> Option<V> {
        // Shard guard is released before the list mutex is taken.
        let Some(handle) = self.index.get(key) else {
            Counters::bump(&self.counters.misses);
            return None;
        };

        let mut list = self.lock_list();
        if list.move_to_front(handle) {
            Counters::bump(&self.counters.hits);
            list.get(handle).cloned()
        } else {
            // Removed or evicted between the index load and the lock.
            Counters::bump(&self.counters.misses);
            None
        }
    }

    fn peek(&self, key: &K) -> Option<V> {
        let handle = self.index.get(key)?;
        self.lock_list().get(handle).cloned()
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn remove(&self, key: &K) -> Option<V> {
        let mut list = self.lock_list();
        let handle = self.index.remove(key)?;
        let (_, value) = list.remove(handle)?;
        Counters::bump(&self.counters.removals);
        Some(value)
    }

    fn clear(&self) {
        let mut list = self.lock_list();
        self.index.clear();
        list.clear();
    }

    fn len(&self) -> usize {
        self.lock_list().len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn keys(&self) -> Vec<K> {
        self.lock_list().iter().map(|(k, _)| k.clone()).collect()
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    fn backend(&self) -> Backend {
        Backend::Split
    }
}

// =============================================================================
// SharedCache
// =============================================================================

/// A concurrent cache whose backend is chosen at construction time.
#[derive(Debug)]
pub enum SharedCache<K, V> {
    Locked(LockedLruCache<K, V>),
    Split(SplitLruCache<K, V>),
}

macro_rules! dispatch {
    ($self:ident, $cache:ident => $body:expr) => {
        match $self {
            SharedCache::Locked($cache) => $body,
            SharedCache::Split($cache) => $body,
        }
    };
}

impl<K: Hash + Eq + Clone, V> SharedCache<K, V> {
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(backend: Backend, capacity: usize) -> Self {
        match backend {
            Backend::Locked => Self::Locked(LockedLruCache::new(capacity)),
            Backend::Split => Self::Split(SplitLruCache::new(capacity)),
        }
    }

    pub fn try_new(backend: Backend, capacity: usize) -> Result<Self, ConfigError> {
        Self::try_with_shards(backend, capacity, DEFAULT_SHARDS)
    }

    /// `shards` only applies to the split backend.
    pub fn try_with_shards(
        backend: Backend,
        capacity: usize,
        shards: usize,
    ) -> Result<Self, ConfigError> {
        Ok(match backend {
            Backend::Locked => Self::Locked(LockedLruCache::try_new(capacity)?),
            Backend::Split => Self::Split(SplitLruCache::try_with_shards(capacity, shards)?),
        })
    }

    pub fn reset_stats(&self) {
        dispatch!(self, c => c.reset_stats());
    }
}

impl<K, V> ConcurrentCache<K, V> for SharedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> Option<(K, V)> {
        dispatch!(self, c => c.put(key, value))
    }

    fn get(&self, key: &K) -> Option<V> {
        dispatch!(self, c => c.get(key))
    }

    fn peek(&self, key: &K) -> Option<V> {
        dispatch!(self, c => c.peek(key))
    }

    fn contains(&self, key: &K) -> bool {
        dispatch!(self, c => c.contains(key))
    }

    fn remove(&self, key: &K) -> Option<V> {
        dispatch!(self, c => c.remove(key))
    }

    fn clear(&self) {
        dispatch!(self, c => c.clear());
    }

    fn len(&self) -> usize {
        dispatch!(self, c => c.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, c => c.capacity())
    }

    fn keys(&self) -> Vec<K> {
        dispatch!(self, c => c.keys())
    }

    fn stats(&self) -> CacheStats {
        dispatch!(self, c => c.stats())
    }

    fn backend(&self) -> Backend {
        dispatch!(self, c => c.backend())
    }
}
