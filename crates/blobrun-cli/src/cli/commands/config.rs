//! `blobrun config` – show where the config lives and what it resolves to.

use anyhow::Result;
use blobrun_core::config::{self, RunnerConfig};
use std::path::Path;

pub fn run_config(path: &Path, cfg: &RunnerConfig) -> Result<()> {
    let policy = cfg.retry_policy();
    println!("config: {}", path.display());
    println!("{}", config::render(cfg)?.trim_end());
    println!();
    println!("effective retry policy:");
    println!("  max_attempts  {}", policy.attempt_budget());
    println!("  base_delay    {:?}", policy.base_delay);
    println!("  max_delay     {:?}", policy.max_delay);
    println!("  jitter        {:?}", policy.jitter);
    Ok(())
}
