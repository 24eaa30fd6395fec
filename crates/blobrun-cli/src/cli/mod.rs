//! CLI for the blobrun task runner.

mod commands;

use anyhow::Result;
use blobrun_core::config::{self, RunnerConfig};
use blobrun_core::sim::FailureMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use commands::{run_bench, run_completions, run_config, run_simulate, BenchArgs, SimulateArgs};

/// Top-level CLI for blobrun.
#[derive(Debug, Parser)]
#[command(name = "blobrun")]
#[command(
    about = "blobrun: bounded-concurrency retrying runner for blob storage operations",
    long_about = None
)]
pub struct Cli {
    /// Config file to use instead of ~/.config/blobrun/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// How simulated operations fail before they succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SimMode {
    /// HTTP 503.
    Unavailable,
    /// Connection refused.
    Refused,
    /// HTTP 429.
    RateLimited,
    /// Alternate connection refused and 503.
    Mixed,
}

impl From<SimMode> for FailureMode {
    fn from(mode: SimMode) -> Self {
        match mode {
            SimMode::Unavailable => FailureMode::Unavailable,
            SimMode::Refused => FailureMode::Refused,
            SimMode::RateLimited => FailureMode::RateLimited,
            SimMode::Mixed => FailureMode::Mixed,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run simulated remote operations through the scheduler and report outcomes.
    Simulate {
        /// Number of operations to submit.
        #[arg(long, default_value = "5", value_name = "N")]
        ops: usize,
        /// Maximum operations in flight (default: concurrency_limit from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Failures each operation sees before it succeeds.
        #[arg(long, default_value = "2", value_name = "K")]
        failures: u32,
        /// Kind of failure the simulated remote returns.
        #[arg(long, value_enum, default_value_t = SimMode::Mixed)]
        mode: SimMode,
        /// Latency of every simulated call in milliseconds.
        #[arg(long, default_value = "200", value_name = "MS")]
        latency_ms: u64,
        /// Operation indices that fail fatally (404), comma separated.
        #[arg(long, value_delimiter = ',', value_name = "I,J")]
        fatal: Vec<usize>,
        /// Override max attempts from config.
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
        /// Disable backoff jitter.
        #[arg(long)]
        no_jitter: bool,
    },

    /// Compare the sequential baseline against bounded concurrency.
    Bench {
        /// Number of operations per run.
        #[arg(long, default_value = "5", value_name = "N")]
        ops: usize,
        /// Concurrency compared against the baseline (default: from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Latency of every simulated call in milliseconds.
        #[arg(long, default_value = "500", value_name = "MS")]
        latency_ms: u64,
        /// Failures each operation sees before it succeeds.
        #[arg(long, default_value = "0", value_name = "K")]
        failures: u32,
    },

    /// Show the config file path and resolved settings.
    Config,

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn load_config(path: Option<&Path>) -> Result<RunnerConfig> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let config_path = cli.config.as_deref();

        match cli.command {
            CliCommand::Simulate {
                ops,
                jobs,
                failures,
                mode,
                latency_ms,
                fatal,
                max_attempts,
                no_jitter,
            } => {
                let cfg = load_config(config_path)?;
                let args = SimulateArgs {
                    ops,
                    jobs,
                    failures,
                    mode: mode.into(),
                    latency_ms,
                    fatal,
                    max_attempts,
                    no_jitter,
                };
                run_simulate(&cfg, &args).await?;
            }
            CliCommand::Bench {
                ops,
                jobs,
                latency_ms,
                failures,
            } => {
                let cfg = load_config(config_path)?;
                let args = BenchArgs {
                    ops,
                    jobs,
                    latency_ms,
                    failures,
                };
                run_bench(&cfg, &args).await?;
            }
            CliCommand::Config => {
                let path = match config_path {
                    Some(p) => p.to_path_buf(),
                    None => config::config_path()?,
                };
                let cfg = load_config(Some(&path))?;
                run_config(&path, &cfg)?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
