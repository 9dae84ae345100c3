//! recall-core: bounded LRU caches with swappable concurrency backends
//!
//! # Architecture
//!
//! ```text
//!                 ConcurrentCache (trait)
//!                  /                 \
//!      LockedLruCache           SplitLruCache
//!   RwLock<LruCache>      ShardedMap<K, Handle> + Mutex<RecencyList>
//!          |
//!   LruCache = HashMap<K, Handle> + RecencyList
//! ```
//!
//! # Modules
//!
//! - `recency_list`: Arena-backed doubly linked list with generation-checked handles
//! - `lru_cache`: Single-threaded LRU controller and statistics
//! - `concurrent_map`: Sharded concurrent map used as the split backend's index
//! - `shared`: Thread-safe backends behind the `ConcurrentCache` trait
//! - `config`: TOML configuration
//! - `logging`: `tracing` subscriber setup for binaries
//! - `error`: Error types
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod concurrent_map;
pub mod config;
pub mod error;
pub mod logging;
pub mod lru_cache;
pub mod recency_list;
pub mod shared;

pub use config::{Backend, CacheConfig, Config};
pub use error::{ConfigError, Error, Result};
pub use lru_cache::{CacheStats, LruCache};
pub use shared::{ConcurrentCache, LockedLruCache, SharedCache, SplitLruCache};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
