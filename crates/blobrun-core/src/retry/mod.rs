//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (transient network
//! markers, rate limiting, server and client errors) and exponential backoff
//! decisions so that the scheduler and direct callers share one policy.

mod classify;
mod error;
mod policy;
mod run;
mod sleep;

pub use classify::{classify, classify_status, has_transient_marker};
pub use error::{OperationError, RemoteFailure};
pub use policy::{next_delay, FailureClass, Jitter, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, run_with_retry_blocking, AttemptEvent, Retrier, RetryReport};
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
