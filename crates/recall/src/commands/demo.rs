//! `recall demo`: a guided tour of the cache operations.

use std::io::Write;

use anyhow::{Context, Result};
use recall_core::config::CacheConfig;
use recall_core::shared::{ConcurrentCache, SharedCache};

const FRUITS: [&str; 10] = [
    "apple", "banana", "cherry", "date", "elderberry", "fig", "grape", "honeydew", "kiwi", "lemon",
];

fn fruit(i: usize) -> String {
    FRUITS
        .get(i)
        .map_or_else(|| format!("fruit{i}"), |name| (*name).to_string())
}

pub fn run(config: &CacheConfig, out: &mut impl Write) -> Result<()> {
    let cache: SharedCache<String, String> =
        config.build().context("invalid cache configuration")?;
    let capacity = cache.capacity();

    writeln!(out, "=== LRU Cache Demo ({} backend) ===", cache.backend())?;

    writeln!(out, "\n1. Adding key-value pairs:")?;
    for i in 0..capacity {
        let name = fruit(i);
        cache.put(name.clone(), format!("{name} value"));
    }
    writeln!(out, "Cache size: {}/{}", cache.len(), capacity)?;
    writeln!(out, "Cache keys: {:?}", cache.keys())?;

    writeln!(out, "\n2. Getting values:")?;
    let first = fruit(0);
    if let Some(value) = cache.get(&first) {
        writeln!(out, "{first}: {value}")?;
    }
    writeln!(out, "Key order after accessing {first}: {:?}", cache.keys())?;

    writeln!(out, "\n3. Adding new key to trigger eviction:")?;
    let newcomer = fruit(capacity);
    let evicted = cache.put(newcomer.clone(), format!("{newcomer} value"));
    writeln!(out, "Keys after adding {newcomer}: {:?}", cache.keys())?;
    if let Some((key, _)) = &evicted {
        if cache.get(key).is_none() {
            writeln!(out, "{key} has been evicted")?;
        }
    }

    writeln!(out, "\n4. Updating existing key:")?;
    // A resident key is replaced in place, so nothing is evicted.
    cache.put(first.clone(), format!("fresh {first} value"));
    if let Some(value) = cache.get(&first) {
        writeln!(out, "Updated {first}: {value}")?;
    }
    writeln!(out, "Cache size after update: {}/{}", cache.len(), capacity)?;

    writeln!(out, "\n5. Using peek (does not affect access order):")?;
    let before = cache.keys();
    writeln!(out, "Key order before peek: {before:?}")?;
    if let Some(target) = before.last() {
        if let Some(value) = cache.peek(target) {
            writeln!(out, "Peek {target}: {value}")?;
        }
    }
    writeln!(out, "Key order after peek: {:?}", cache.keys())?;

    writeln!(out, "\n6. Checking key existence:")?;
    writeln!(out, "Contains {first}: {}", cache.contains(&first))?;
    if let Some((key, _)) = &evicted {
        writeln!(out, "Contains {key}: {}", cache.contains(key))?;
    }

    writeln!(out, "\n7. Removing key:")?;
    if cache.remove(&newcomer).is_some() {
        writeln!(out, "{newcomer} has been removed")?;
    }
    writeln!(out, "Keys after removal: {:?}", cache.keys())?;
    writeln!(out, "Cache size: {}/{}", cache.len(), capacity)?;

    writeln!(out, "\n8. Clearing cache:")?;
    cache.clear();
    writeln!(out, "Cache size after clear: {}/{}", cache.len(), capacity)?;
    writeln!(out, "Cache keys: {:?}", cache.keys())?;

    let stats = cache.stats();
    writeln!(
        out,
        "Stats: hits={} misses={} evictions={} hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.hit_rate()
    )?;

    writeln!(out, "\n=== LRU Algorithm Features Demo ===")?;
    lru_behavior(config, out)
}

/// Fixed three-entry walkthrough of recency and eviction order.
fn lru_behavior(config: &CacheConfig, out: &mut impl Write) -> Result<()> {
    let config = CacheConfig {
        capacity: 3,
        ..config.clone()
    };
    let cache: SharedCache<u32, &'static str> = config.build()?;
    writeln!(out, "Create cache with capacity 3")?;

    cache.put(1, "one");
    cache.put(2, "two");
    cache.put(3, "three");
    writeln!(out, "After adding 1,2,3: {:?}", cache.keys())?;

    cache.get(&1);
    writeln!(out, "After accessing 1: {:?}", cache.keys())?;

    cache.put(4, "four");
    writeln!(out, "After adding 4: {:?}", cache.keys())?;
    if !cache.contains(&2) {
        writeln!(out, "Element 2 has been evicted (LRU policy)")?;
    }

    cache.get(&3);
    writeln!(out, "After accessing 3: {:?}", cache.keys())?;

    cache.put(5, "five");
    writeln!(out, "After adding 5: {:?}", cache.keys())?;
    if !cache.contains(&1) {
        writeln!(out, "Element 1 has been evicted (LRU policy)")?;
    }
    Ok(())
}
