//! Multi-threaded stress tests for both backends.
//!
//! Writers own disjoint key ranges and write every key twice; readers
//! hammer get/peek/contains/len/keys concurrently. Afterwards the cache is
//! within capacity and every resident key holds its last-written value.

use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use recall_core::config::Backend;
use recall_core::shared::{ConcurrentCache, SharedCache};

const WRITERS: usize = 8;
const READERS: usize = 8;
const KEYS_PER_WRITER: usize = 200;

fn value_for(key: &str, round: u32) -> String {
    format!("{key}#v{round}")
}

fn stress(backend: Backend, capacity: usize) {
    let cache: Arc<SharedCache<String, String>> = Arc::new(SharedCache::new(backend, capacity));
    let barrier = Arc::new(Barrier::new(WRITERS + READERS));

    let mut handles = Vec::new();
    for w in 0..WRITERS {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for round in 0..2 {
                for i in 0..KEYS_PER_WRITER {
                    let key = format!("writer{w}_item{i}");
                    let value = value_for(&key, round);
                    cache.put(key, value);
                }
            }
        }));
    }

    for r in 0..READERS {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..KEYS_PER_WRITER * 2 {
                let key = format!("writer{}_item{}", (r + i) % WRITERS, i % KEYS_PER_WRITER);
                if let Some(v) = cache.get(&key) {
                    assert!(v.starts_with(&key), "value {v} does not belong to {key}");
                }
                let _ = cache.peek(&key);
                let _ = cache.contains(&key);
                if i % 50 == 0 {
                    assert!(cache.len() <= cache.capacity());
                    assert!(cache.keys().len() <= cache.capacity());
                }
            }
        }));
    }

    for h in handles {
        h.join().expect("worker panicked");
    }

    assert!(cache.len() <= cache.capacity());
    let keys = cache.keys();
    assert_eq!(keys.len(), cache.len());
    for key in &keys {
        assert!(cache.contains(key));
        assert_eq!(cache.peek(key), Some(value_for(key, 1)), "{backend}: stale value for {key}");
    }
}

#[test]
fn locked_backend_under_contention() {
    stress(Backend::Locked, 100);
}

#[test]
fn split_backend_under_contention() {
    stress(Backend::Split, 100);
}

#[test]
fn locked_backend_no_eviction_pressure() {
    stress(Backend::Locked, WRITERS * KEYS_PER_WRITER);
}

#[test]
fn split_backend_no_eviction_pressure() {
    stress(Backend::Split, WRITERS * KEYS_PER_WRITER);
}

#[test]
fn all_keys_resident_when_capacity_suffices() {
    for backend in [Backend::Locked, Backend::Split] {
        let cache = Arc::new(SharedCache::<u64, u64>::new(backend, 1_000));
        thread::scope(|s| {
            for t in 0..10u64 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..100u64 {
                        cache.put(t * 100 + i, i);
                    }
                });
            }
        });

        assert_eq!(cache.len(), 1_000);
        assert_eq!(cache.stats().insertions, 1_000);
        assert_eq!(cache.stats().evictions, 0);
        for t in 0..10u64 {
            for i in 0..100u64 {
                assert_eq!(cache.get(&(t * 100 + i)), Some(i));
            }
        }
    }
}

#[test]
fn concurrent_removes_and_clears_leave_consistent_state() {
    for backend in [Backend::Locked, Backend::Split] {
        let cache = SharedCache::<u32, u32>::new(backend, 64);
        thread::scope(|s| {
            for t in 0..4u32 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..2_000u32 {
                        let key = (t * 7 + i) % 128;
                        match i % 5 {
                            0 => {
                                cache.remove(&key);
                            }
                            1 if i % 500 == 1 => cache.clear(),
                            _ => {
                                cache.put(key, key);
                            }
                        }
                        let _ = cache.get(&((key + 1) % 128));
                    }
                });
            }
        });

        let keys = cache.keys();
        assert_eq!(keys.len(), cache.len());
        assert!(cache.len() <= 64);
        for key in keys {
            assert_eq!(cache.peek(&key), Some(key));
        }
    }
}
