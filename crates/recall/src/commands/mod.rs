//! Subcommand implementations. Each writes its report to the given writer.

pub mod compare;
pub mod concurrent;
pub mod demo;

use std::time::Duration;

/// Milliseconds with microsecond resolution, for reports.
pub fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}
