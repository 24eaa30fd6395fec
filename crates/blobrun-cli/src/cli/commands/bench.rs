//! `blobrun bench` – sequential baseline vs bounded concurrency.

use anyhow::Result;
use blobrun_core::bench::{self, BenchParams, BenchResult};
use blobrun_core::config::RunnerConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BenchArgs {
    pub ops: usize,
    pub jobs: Option<usize>,
    pub latency_ms: u64,
    pub failures: u32,
}

fn print_bench_results(results: &[BenchResult]) {
    println!(
        "  {:>6}  {:>6}  {:>8}  {:>8}  {:>8}  {:>8}",
        "Jobs", "Done", "Time(s)", "Ops/s", "MiB/s", "Retries"
    );
    println!(
        "  {}  {}  {}  {}  {}  {}",
        "------", "------", "--------", "--------", "--------", "--------"
    );
    for r in results {
        println!(
            "  {:>6}  {:>6}  {:>8.2}  {:>8.2}  {:>8.2}  {:>8}",
            r.concurrency,
            format!("{}/{}", r.succeeded, r.operations),
            r.elapsed_secs,
            r.ops_per_sec,
            r.throughput_mib_s,
            r.retries
        );
    }
}

pub async fn run_bench(cfg: &RunnerConfig, args: &BenchArgs) -> Result<()> {
    if args.ops == 0 {
        anyhow::bail!("--ops must be at least 1");
    }
    let params = BenchParams {
        operations: args.ops,
        concurrency: args.jobs.unwrap_or(cfg.concurrency_limit).max(1),
        latency: Duration::from_millis(args.latency_ms),
        failures: args.failures,
        ..BenchParams::default()
    };
    println!(
        "Running {} simulated operations ({} ms each), sequential vs {} at a time...",
        params.operations,
        args.latency_ms,
        params.concurrency
    );
    let results = bench::run_bench(&params, &cfg.retry_policy()).await;
    print_bench_results(&results);
    match bench::speedup(&results) {
        Some(s) if s > 1.0 => println!("Concurrent run was {:.1}x faster.", s),
        Some(_) => println!("No improvement over the sequential baseline."),
        None => println!("Concurrency 1 is the sequential baseline; nothing to compare."),
    }
    Ok(())
}
