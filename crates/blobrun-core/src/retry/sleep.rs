//! Pluggable suspension used between attempts.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspends the current attempt loop for a backoff delay.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Real timer-backed sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(delay)
    }
}

/// Returns immediately and remembers every requested delay.
///
/// Used for dry runs and for asserting backoff schedules without waiting.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        match self.delays.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        match self.delays.lock() {
            Ok(mut guard) => guard.push(delay),
            Err(poisoned) => poisoned.into_inner().push(delay),
        }
        std::future::ready(())
    }
}
