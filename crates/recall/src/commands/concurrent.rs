//! `recall concurrent`: put, get and mixed phases against one shared cache.

use std::io::Write;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use recall_core::config::CacheConfig;
use recall_core::shared::{ConcurrentCache, SharedCache};

use super::millis;

/// Thread and operation counts for the three phases.
#[derive(Debug, Clone)]
pub struct Workload {
    pub workers: usize,
    pub items: usize,
    pub readers: usize,
    pub reads: usize,
}

/// Spacing between writers' stored values: writer `w` stores `w * VALUE_STRIDE + j`.
const VALUE_STRIDE: usize = 1000;

impl Workload {
    /// Rejects counts whose stored values or reported totals overflow `usize`.
    pub fn check(&self) -> Result<()> {
        let values = self.workers.checked_mul(VALUE_STRIDE.max(self.items));
        let puts = self.workers.checked_mul(self.items);
        let gets = self.readers.checked_mul(self.reads);
        ensure!(
            values.is_some() && puts.is_some() && gets.is_some(),
            "workload too large: {} workers x {} items, {} readers x {} reads",
            self.workers,
            self.items,
            self.readers,
            self.reads
        );
        Ok(())
    }
}

type Cache = SharedCache<String, usize>;

pub fn run(config: &CacheConfig, workload: &Workload, out: &mut impl Write) -> Result<()> {
    workload.check()?;
    let cache: Cache = config.build().context("invalid cache configuration")?;
    tracing::info!(
        backend = %cache.backend(),
        capacity = cache.capacity(),
        workers = workload.workers,
        readers = workload.readers,
        "starting concurrent demo"
    );

    writeln!(out, "=== LRU Cache Concurrent Demo ({} backend) ===", cache.backend())?;

    writeln!(out, "\n1. Concurrent put operations:")?;
    put_phase(&cache, workload, out)?;

    writeln!(out, "\n2. Concurrent get operations:")?;
    get_phase(&cache, workload, out)?;

    writeln!(out, "\n3. Mixed concurrent operations:")?;
    mixed_phase(&cache, workload, out)?;

    let stats = cache.stats();
    writeln!(
        out,
        "\nStats: hits={} misses={} insertions={} evictions={} hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.insertions,
        stats.evictions,
        stats.hit_rate()
    )?;
    Ok(())
}

fn put_phase(cache: &Cache, w: &Workload, out: &mut impl Write) -> Result<()> {
    let start = Instant::now();
    thread::scope(|s| {
        for worker in 0..w.workers {
            s.spawn(move || {
                for j in 0..w.items {
                    cache.put(format!("worker{worker}_item{j}"), worker * VALUE_STRIDE + j);
                }
            });
        }
    });
    let elapsed = start.elapsed();

    writeln!(
        out,
        "Added {} items concurrently in {:.3}ms",
        w.workers * w.items,
        millis(elapsed)
    )?;
    writeln!(out, "Final cache size: {}", cache.len())?;
    Ok(())
}

fn get_phase(cache: &Cache, w: &Workload, out: &mut impl Write) -> Result<()> {
    let prefill = (cache.capacity() / 2).max(1);
    for i in 0..prefill {
        cache.put(format!("key{i}"), i * 10);
    }

    let start = Instant::now();
    thread::scope(|s| {
        for _ in 0..w.readers {
            s.spawn(move || {
                for j in 0..w.reads {
                    let _ = cache.get(&format!("key{}", j % prefill));
                }
            });
        }
    });
    let elapsed = start.elapsed();

    writeln!(
        out,
        "Performed {} reads concurrently in {:.3}ms",
        w.readers * w.reads,
        millis(elapsed)
    )?;
    Ok(())
}

fn mixed_phase(cache: &Cache, w: &Workload, out: &mut impl Write) -> Result<()> {
    let writers = w.workers.max(1);
    let start = Instant::now();
    thread::scope(|s| {
        for writer in 0..writers {
            s.spawn(move || {
                for j in 0..w.items {
                    cache.put(format!("mixed_key_{writer}_{j}"), writer * VALUE_STRIDE + j);
                }
            });
        }

        for reader in 0..w.readers {
            s.spawn(move || {
                for j in 0..w.reads {
                    let key = format!("mixed_key_{}_{}", reader % writers, j);
                    let _ = cache.get(&key);
                    let _ = cache.peek(&key);
                    let _ = cache.contains(&key);
                }
            });
        }

        s.spawn(move || {
            for _ in 0..w.reads {
                let len = cache.len();
                let keys = cache.keys();
                debug_assert!(len <= cache.capacity() && keys.len() <= cache.capacity());
                thread::yield_now();
            }
        });
    });
    let elapsed = start.elapsed();

    writeln!(out, "Mixed operations completed in {:.3}ms", millis(elapsed))?;
    writeln!(out, "Final cache size: {}", cache.len())?;
    Ok(())
}
