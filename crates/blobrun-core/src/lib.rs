//! Bounded-concurrency retrying task runner for remote storage operations.
//!
//! [`retry`] classifies failures and decides backoff; [`scheduler`] admits at
//! most N operations at a time and drives each through the retry policy.

pub mod config;
pub mod logging;

pub mod bench;
pub mod retry;
pub mod scheduler;
pub mod sim;

pub use retry::{run_with_retry, OperationError, RetryPolicy};
pub use scheduler::{schedule, OperationOutcome, Scheduler};
