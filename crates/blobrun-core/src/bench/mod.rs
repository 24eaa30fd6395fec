//! Benchmark mode: sequential baseline vs bounded concurrency.
//!
//! Runs the same batch of simulated remote operations once with a single slot
//! and once with the requested concurrency, and reports elapsed time,
//! operations per second, and payload throughput for each run.

use std::time::Duration;

use tokio::time::Instant;

use crate::retry::RetryPolicy;
use crate::scheduler::{Scheduler, ScheduleSummary};
use crate::sim::{self, FailureMode};

/// Default simulated payload per operation (1 MiB).
pub const DEFAULT_PAYLOAD_BYTES: u64 = 1024 * 1024;

/// Shape of the simulated batch.
#[derive(Debug, Clone)]
pub struct BenchParams {
    pub operations: usize,
    /// Concurrency compared against the sequential baseline.
    pub concurrency: usize,
    pub latency: Duration,
    /// Failures each operation sees before succeeding.
    pub failures: u32,
    pub mode: FailureMode,
    pub payload_bytes: u64,
}

impl Default for BenchParams {
    fn default() -> Self {
        Self {
            operations: 5,
            concurrency: 2,
            latency: Duration::from_millis(200),
            failures: 0,
            mode: FailureMode::Unavailable,
            payload_bytes: DEFAULT_PAYLOAD_BYTES,
        }
    }
}

/// Result of one benchmark run (one concurrency level).
#[derive(Debug, Clone)]
pub struct BenchResult {
    pub concurrency: usize,
    pub operations: usize,
    pub succeeded: usize,
    /// Attempts beyond the first, summed over operations.
    pub retries: u64,
    pub elapsed_secs: f64,
    pub ops_per_sec: f64,
    pub throughput_mib_s: f64,
}

async fn run_once(params: &BenchParams, policy: &RetryPolicy, concurrency: usize) -> BenchResult {
    let remotes = sim::batch(params.operations, params.failures, params.mode, params.latency);
    let scheduler = Scheduler::new(*policy, concurrency);
    let start = Instant::now();
    let outcomes = scheduler
        .schedule(remotes.iter().map(|r| r.operation()))
        .await;
    let elapsed_secs = start.elapsed().as_secs_f64();
    let summary = ScheduleSummary::from_outcomes(&outcomes);
    let admitted = (summary.succeeded + summary.failed) as u64;
    let (ops_per_sec, throughput_mib_s) = if elapsed_secs > 0.0 {
        let bytes = summary.succeeded as f64 * params.payload_bytes as f64;
        (
            summary.succeeded as f64 / elapsed_secs,
            bytes / 1_048_576.0 / elapsed_secs,
        )
    } else {
        (0.0, 0.0)
    };
    BenchResult {
        concurrency: scheduler.concurrency_limit(),
        operations: summary.total,
        succeeded: summary.succeeded,
        retries: summary.attempts.saturating_sub(admitted),
        elapsed_secs,
        ops_per_sec,
        throughput_mib_s,
    }
}

/// Runs the sequential baseline, then the concurrent run (skipped when the
/// requested concurrency is 1).
pub async fn run_bench(params: &BenchParams, policy: &RetryPolicy) -> Vec<BenchResult> {
    let mut levels = vec![1];
    if params.concurrency > 1 {
        levels.push(params.concurrency);
    }
    let mut results = Vec::with_capacity(levels.len());
    for concurrency in levels {
        let result = run_once(params, policy, concurrency).await;
        tracing::info!(
            concurrency,
            elapsed_secs = result.elapsed_secs,
            succeeded = result.succeeded,
            "bench run finished"
        );
        results.push(result);
    }
    results
}

/// How much faster the last run was than the sequential baseline.
pub fn speedup(results: &[BenchResult]) -> Option<f64> {
    let base = results.first()?;
    let last = results.last()?;
    if results.len() < 2 || last.elapsed_secs <= 0.0 {
        return None;
    }
    Some(base.elapsed_secs / last.elapsed_secs)
}
