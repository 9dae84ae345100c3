//! `recall compare`: basic behavior and a mixed workload on both backends.

use std::io::Write;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use recall_core::config::{Backend, CacheConfig};
use recall_core::lru_cache::CacheStats;
use recall_core::shared::{ConcurrentCache, SharedCache};
use serde::Serialize;

use super::millis;
use crate::ReportFormat;

const BACKENDS: [Backend; 2] = [Backend::Locked, Backend::Split];

/// Per-thread width of the hot read range in the mixed workload.
const HOT_KEYS: usize = 100;

/// Capacity-3 walkthrough run on each backend.
#[derive(Debug, Serialize)]
pub struct BasicCheck {
    pub backend: Backend,
    pub keys: Vec<String>,
    pub get_apple: Option<String>,
    pub keys_after_get: Vec<String>,
    pub keys_after_put: Vec<String>,
    pub evicted: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BackendRun {
    pub backend: Backend,
    pub elapsed_ms: f64,
    pub final_len: usize,
    pub stats: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub capacity: usize,
    pub threads: usize,
    pub ops_per_thread: usize,
    pub basic: Vec<BasicCheck>,
    pub runs: Vec<BackendRun>,
    pub faster: Backend,
    pub percent_faster: f64,
}

pub fn run(
    config: &CacheConfig,
    threads: usize,
    ops: usize,
    format: ReportFormat,
    out: &mut impl Write,
) -> Result<()> {
    config.validate().context("invalid cache configuration")?;
    let report = measure(config, threads, ops)?;

    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        ReportFormat::Text => render_text(&report, out)?,
    }
    Ok(())
}

pub fn measure(config: &CacheConfig, threads: usize, ops: usize) -> Result<CompareReport> {
    // Put keys reach threads * ops and hot reads reach threads * HOT_KEYS.
    ensure!(
        threads.checked_mul(ops.max(HOT_KEYS)).is_some(),
        "workload too large: {threads} threads x {ops} ops overflows the key space"
    );

    let mut basic = Vec::with_capacity(BACKENDS.len());
    for backend in BACKENDS {
        basic.push(basic_check(config, backend)?);
    }

    let mut runs = Vec::with_capacity(BACKENDS.len());
    for backend in BACKENDS {
        let cfg = CacheConfig {
            backend,
            ..config.clone()
        };
        let cache: SharedCache<usize, usize> = cfg.build()?;
        let start = Instant::now();
        mixed_workload(&cache, threads, ops);
        let elapsed_ms = millis(start.elapsed());
        tracing::debug!(%backend, elapsed_ms, "workload finished");

        runs.push(BackendRun {
            backend,
            elapsed_ms,
            final_len: cache.len(),
            stats: cache.stats(),
        });
    }

    let (faster, percent_faster) = relative_speed(&runs[0], &runs[1]);
    Ok(CompareReport {
        capacity: config.capacity,
        threads,
        ops_per_thread: ops,
        basic,
        runs,
        faster,
        percent_faster,
    })
}

fn basic_check(config: &CacheConfig, backend: Backend) -> Result<BasicCheck> {
    let cfg = CacheConfig {
        capacity: 3,
        backend,
        ..config.clone()
    };
    let cache: SharedCache<String, String> = cfg.build()?;
    for fruit in ["apple", "banana", "cherry"] {
        cache.put(fruit.to_string(), format!("{fruit} value"));
    }
    let keys = cache.keys();
    let get_apple = cache.get(&"apple".to_string());
    let keys_after_get = cache.keys();
    let evicted = cache
        .put("date".to_string(), "date value".to_string())
        .map(|(k, _)| k);
    Ok(BasicCheck {
        backend,
        keys,
        get_apple,
        keys_after_get,
        keys_after_put: cache.keys(),
        evicted,
    })
}

/// Every third op puts a fresh key; the rest read a small hot range.
fn mixed_workload(cache: &SharedCache<usize, usize>, threads: usize, ops: usize) {
    thread::scope(|s| {
        for id in 0..threads {
            s.spawn(move || {
                for j in 0..ops {
                    if j % 3 == 0 {
                        cache.put(id * ops + j, j);
                    } else {
                        let _ = cache.get(&(id * HOT_KEYS + j % HOT_KEYS));
                    }
                }
            });
        }
    });
}

fn relative_speed(a: &BackendRun, b: &BackendRun) -> (Backend, f64) {
    let (fast, slow) = if a.elapsed_ms <= b.elapsed_ms { (a, b) } else { (b, a) };
    let percent = if slow.elapsed_ms > 0.0 {
        (slow.elapsed_ms - fast.elapsed_ms) / slow.elapsed_ms * 100.0
    } else {
        0.0
    };
    (fast.backend, percent)
}

fn render_text(report: &CompareReport, out: &mut impl Write) -> Result<()> {
    writeln!(out, "=== LRU Cache Backend Comparison ===")?;

    for (i, check) in report.basic.iter().enumerate() {
        writeln!(out, "\n{}. {} backend:", i + 1, check.backend)?;
        writeln!(out, "   Keys: {:?}", check.keys)?;
        if let Some(value) = &check.get_apple {
            writeln!(out, "   Get apple: {value}")?;
        }
        writeln!(out, "   Keys after accessing apple: {:?}", check.keys_after_get)?;
        writeln!(out, "   Keys after adding date: {:?}", check.keys_after_put)?;
        if let Some(key) = &check.evicted {
            writeln!(out, "   Evicted: {key}")?;
        }
    }

    writeln!(
        out,
        "\n{}. Performance comparison ({} threads x {} ops, capacity {}):",
        report.basic.len() + 1,
        report.threads,
        report.ops_per_thread,
        report.capacity
    )?;
    for run in &report.runs {
        writeln!(out, "   {} backend: {:.3}ms", run.backend, run.elapsed_ms)?;
    }
    writeln!(
        out,
        "   {} is {:.1}% faster",
        report.faster, report.percent_faster
    )?;

    let sizes: Vec<String> = report
        .runs
        .iter()
        .map(|r| format!("{}: {}", r.backend, r.final_len))
        .collect();
    writeln!(out, "\n   Final cache sizes - {}", sizes.join(", "))?;
    Ok(())
}
