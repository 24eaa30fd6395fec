//! CLI command handlers. Each command is in its own file.

mod bench;
mod completions;
mod config;
mod simulate;

pub use bench::{run_bench, BenchArgs};
pub use completions::run_completions;
pub use config::run_config;
pub use simulate::{run_simulate, SimulateArgs};
