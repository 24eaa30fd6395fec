use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{Jitter, RetryPolicy};

/// Retry policy parameters (optional section in config.toml).
/// Missing keys take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per operation (including the first).
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds (before jitter).
    pub max_delay_ms: u64,
    /// Add random jitter to each backoff delay.
    pub jitter: bool,
    /// Upper bound for the jitter in milliseconds; defaults to `base_delay_ms`.
    pub jitter_ceiling_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 10_000,
            jitter: true,
            jitter_ceiling_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let jitter = match (self.jitter, self.jitter_ceiling_ms) {
            (false, _) => Jitter::None,
            (true, None) => Jitter::UpToBase,
            (true, Some(ms)) => Jitter::UpTo(Duration::from_millis(ms)),
        };
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter,
        }
    }
}

/// Global configuration loaded from `~/.config/blobrun/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum number of operations in flight at once.
    pub concurrency_limit: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 2,
            retry: None,
        }
    }
}

impl RunnerConfig {
    /// Retry policy from the `[retry]` section, or the defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().to_policy()
    }
}

/// Serialize a config the way it is stored on disk.
pub fn render(cfg: &RunnerConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("blobrun")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`, writing defaults there if it does not exist.
pub fn load_from_path(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let default_cfg = RunnerConfig::default();
        let toml = render(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RunnerConfig> {
    load_from_path(&config_path()?)
}
