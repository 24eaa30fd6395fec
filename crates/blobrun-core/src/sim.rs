//! Simulated remote storage operations.
//!
//! Stands in for a real blob-store client: each [`FlakyRemote`] fails a fixed
//! number of times in a chosen way, then succeeds. Every call takes a fixed
//! latency so concurrency effects are visible.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::retry::OperationError;

/// How a simulated remote fails before it starts succeeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// HTTP 503 Service Unavailable.
    #[default]
    Unavailable,
    /// Connection refused at the socket level.
    Refused,
    /// HTTP 429 Too Many Requests.
    RateLimited,
    /// Alternates connection refused and 503.
    Mixed,
    /// HTTP 404; never recovers within the retry budget.
    Fatal,
}

impl FailureMode {
    fn error_for_call(self, call: u32) -> OperationError {
        match self {
            FailureMode::Unavailable => OperationError::with_status("Service Unavailable", 503),
            FailureMode::Refused => OperationError::new("Network Error: Connection refused"),
            FailureMode::RateLimited => OperationError::with_status("Too Many Requests", 429),
            FailureMode::Mixed if call % 2 == 1 => {
                OperationError::new("Network Error: Connection refused")
            }
            FailureMode::Mixed => OperationError::with_status("Service Unavailable", 503),
            FailureMode::Fatal => OperationError::with_status("blob not found", 404),
        }
    }
}

/// What a successful simulated store returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Index of the remote that produced this receipt.
    pub remote: usize,
    /// Call number (1-based) that succeeded.
    pub attempt: u32,
    pub receipt: String,
}

pub type RemoteFuture = Pin<Box<dyn Future<Output = Result<StoredBlob, OperationError>> + Send>>;

/// A remote that fails `failures` times, then succeeds.
#[derive(Debug, Clone)]
pub struct FlakyRemote {
    id: usize,
    failures: u32,
    mode: FailureMode,
    latency: Duration,
    calls: Arc<AtomicU32>,
}

impl FlakyRemote {
    pub fn new(id: usize, failures: u32, mode: FailureMode, latency: Duration) -> Self {
        Self {
            id,
            failures,
            mode,
            latency,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// A remote that always succeeds.
    pub fn healthy(id: usize, latency: Duration) -> Self {
        Self::new(id, 0, FailureMode::Unavailable, latency)
    }

    /// Number of times this remote has been invoked.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// One invocation.
    pub async fn store(&self) -> Result<StoredBlob, OperationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(remote = self.id, call, "simulated store");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.mode == FailureMode::Fatal || call <= self.failures {
            return Err(self.mode.error_for_call(call));
        }
        Ok(StoredBlob {
            remote: self.id,
            attempt: call,
            receipt: format!("sim-{:04}-{}", self.id, call),
        })
    }

    /// Operation closure suitable for the scheduler or the retry engine.
    pub fn operation(&self) -> impl FnMut() -> RemoteFuture + Send + 'static {
        let remote = self.clone();
        move || -> RemoteFuture {
            let remote = remote.clone();
            Box::pin(async move { remote.store().await })
        }
    }
}

/// `count` remotes sharing the same failure pattern and latency.
pub fn batch(count: usize, failures: u32, mode: FailureMode, latency: Duration) -> Vec<FlakyRemote> {
    (0..count)
        .map(|id| FlakyRemote::new(id, failures, mode, latency))
        .collect()
}
