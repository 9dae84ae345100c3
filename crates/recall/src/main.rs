//! recall - LRU cache walkthroughs and backend comparisons

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use recall_core::config::{Backend, CacheConfig, Config, LogFormat};
use recall_core::logging::init_logging;

mod commands;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "recall",
    version,
    about = "Bounded LRU caches with swappable concurrency backends",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML config file ([cache] and [logging] sections).
    #[arg(long, global = true, env = "RECALL_CONFIG")]
    config: Option<PathBuf>,

    /// Concurrency backend: locked or split.
    #[arg(long, global = true)]
    backend: Option<Backend>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: pretty or json. Logs always go to stderr.
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Command {
    /// Walk through put/get/evict/update/peek/contains/remove/clear.
    Demo(DemoArgs),

    /// Concurrent put, get and mixed phases against one shared cache.
    Concurrent(ConcurrentArgs),

    /// Run the same workload on both backends and compare.
    Compare(CompareArgs),
}

#[derive(Args)]
struct DemoArgs {
    /// Cache capacity (default: 3).
    #[arg(long)]
    capacity: Option<usize>,
}

#[derive(Args)]
struct ConcurrentArgs {
    /// Cache capacity (default: 100).
    #[arg(long)]
    capacity: Option<usize>,

    /// Writer threads in the put phase.
    #[arg(long, default_value_t = 10)]
    workers: usize,

    /// Items each writer puts.
    #[arg(long, default_value_t = 20)]
    items: usize,

    /// Reader threads in the get phase.
    #[arg(long, default_value_t = 20)]
    readers: usize,

    /// Gets per reader.
    #[arg(long, default_value_t = 50)]
    reads: usize,
}

#[derive(Args)]
struct CompareArgs {
    /// Cache capacity (default: 100).
    #[arg(long)]
    capacity: Option<usize>,

    /// Threads running the mixed workload.
    #[arg(long, default_value_t = 50)]
    threads: usize,

    /// Operations per thread.
    #[arg(long, default_value_t = 1000)]
    ops: usize,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Config resolution: CLI flag > config file > default
// ---------------------------------------------------------------------------

struct Resolved {
    config: Config,
    file_capacity: Option<usize>,
}

fn resolve(cli: &Cli) -> Result<Resolved> {
    let (mut config, file_capacity) = match &cli.config {
        Some(path) => {
            let config = Config::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            let capacity = config.cache.capacity;
            (config, Some(capacity))
        }
        None => (Config::default(), None),
    };

    if let Some(backend) = cli.backend {
        config.cache.backend = backend;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    Ok(Resolved {
        config,
        file_capacity,
    })
}

impl Resolved {
    fn cache_config(&self, flag: Option<usize>, fallback: usize) -> CacheConfig {
        CacheConfig {
            capacity: flag.or(self.file_capacity).unwrap_or(fallback),
            ..self.config.cache.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let resolved = resolve(&cli)?;

    init_logging(&resolved.config.logging).context("failed to initialize logging")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Demo(a) => {
            let cache = resolved.cache_config(a.capacity, 3);
            commands::demo::run(&cache, &mut out)?;
        }
        Command::Concurrent(a) => {
            let cache = resolved.cache_config(a.capacity, 100);
            let workload = commands::concurrent::Workload {
                workers: a.workers,
                items: a.items,
                readers: a.readers,
                reads: a.reads,
            };
            commands::concurrent::run(&cache, &workload, &mut out)?;
        }
        Command::Compare(a) => {
            let cache = resolved.cache_config(a.capacity, 100);
            commands::compare::run(&cache, a.threads, a.ops, a.format, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
