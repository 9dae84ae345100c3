//! Sharded key index for the split LRU backend
//!
//! [`crate::shared::SplitLruCache`] keeps its recency list behind one mutex
//! and its key → [`crate::recency_list::Handle`] index here. Splitting the
//! index over independently locked shards lets `contains` and the first half
//! of `get`/`peek` run in parallel for different keys.
//!
//! Each shard is an `RwLock<HashMap>` aligned to 128 bytes so neighbouring
//! locks never share a cache line. A key lives in exactly one shard, chosen
//! by a per-map randomly seeded hasher. No method ever holds two shard locks
//! at once; whole-index walks (`len`, `clear`, `shard_sizes`) lock shards one
//! after another.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, RandomState};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

/// Shard count used when none is configured. A power of two.
pub const DEFAULT_SHARDS: usize = 64;

/// Largest accepted shard count.
pub const MAX_SHARDS: usize = 256;

#[repr(align(128))]
struct Shard<K, V>(RwLock<HashMap<K, V>>);

impl<K, V> Shard<K, V> {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.0.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// A hash map split over independently locked shards.
///
/// Every single-key operation is atomic with respect to that key.
/// Cross-shard reads are point-in-time per shard, not a global snapshot.
pub struct ShardedMap<K, V> {
    shards: Box<[Shard<K, V>]>,
    hasher: RandomState,
}

impl<K, V> std::fmt::Debug for ShardedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedMap")
            .field("shards", &self.shards.len())
            .finish_non_exhaustive()
    }
}

impl<K, V> ShardedMap<K, V> {
    /// Create an empty map with `shards` shards, clamped to `[1, MAX_SHARDS]`.
    #[must_use]
    pub fn with_shards(shards: usize) -> Self {
        let shards = shards.clamp(1, MAX_SHARDS);
        Self {
            shards: (0..shards)
                .map(|_| Shard(RwLock::new(HashMap::new())))
                .collect(),
            hasher: RandomState::new(),
        }
    }

    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Entries per shard, in shard order.
    pub fn shard_sizes(&self) -> Vec<usize> {
        self.shards.iter().map(|shard| shard.read().len()).collect()
    }

    /// Total entries. Under concurrent writes this is an estimate.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.write().clear();
        }
    }
}

impl<K: Hash + Eq, V> ShardedMap<K, V> {
    fn shard_for(&self, key: &K) -> &Shard<K, V> {
        // Truncating the hash on 32-bit targets still spreads keys.
        let slot = self.hasher.hash_one(key) as usize % self.shards.len();
        &self.shards[slot]
    }

    /// Insert or overwrite. Returns the value previously stored for `key`.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.shard_for(&key).write().insert(key, value)
    }

    /// Copy of the value for `key`. The shard lock is released on return.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.shard_for(key).read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.shard_for(key).read().contains_key(key)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.shard_for(key).write().remove(key)
    }
}

/// How evenly entries spread over shards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub shard_count: usize,
    pub total_entries: usize,
    pub min_shard_size: usize,
    pub max_shard_size: usize,
    pub mean_shard_size: f64,
    pub stddev_shard_size: f64,
}

impl DistributionStats {
    /// Summarize per-shard entry counts. An empty slice yields all zeros.
    #[must_use]
    pub fn from_shard_sizes(sizes: &[usize]) -> Self {
        let Some((&min, &max)) = sizes.iter().min().zip(sizes.iter().max()) else {
            return Self {
                shard_count: 0,
                total_entries: 0,
                min_shard_size: 0,
                max_shard_size: 0,
                mean_shard_size: 0.0,
                stddev_shard_size: 0.0,
            };
        };

        let total: usize = sizes.iter().sum();
        let n = sizes.len() as f64;
        let mean = total as f64 / n;
        let variance = sizes
            .iter()
            .map(|&size| {
                let delta = size as f64 - mean;
                delta * delta
            })
            .sum::<f64>()
            / n;

        Self {
            shard_count: sizes.len(),
            total_entries: total,
            min_shard_size: min,
            max_shard_size: max,
            mean_shard_size: mean,
            stddev_shard_size: variance.sqrt(),
        }
    }
}
