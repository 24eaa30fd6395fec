//! Retry loop: run an operation until success or the policy says stop.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::classify::classify;
use super::error::RemoteFailure;
use super::policy::{FailureClass, RetryDecision, RetryPolicy};
use super::sleep::{Sleeper, TokioSleeper};

/// Progress of one operation through its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptEvent {
    /// Attempt `attempt` (1-based) is about to be invoked.
    Started { attempt: u32 },
    /// Attempt `attempt` failed with a retryable class; waiting `delay`.
    Retrying {
        attempt: u32,
        class: FailureClass,
        delay: Duration,
    },
}

/// Terminal result of a retried operation plus the bookkeeping around it.
#[derive(Debug)]
pub struct RetryReport<T, E> {
    /// Success value, or the error from the last attempt (never wrapped).
    pub result: Result<T, E>,
    /// Number of times the operation was invoked.
    pub attempts: u32,
    /// Class of the final error; `None` on success.
    pub class: Option<FailureClass>,
    /// Retrying stopped because cancellation was requested.
    pub cancelled: bool,
}

/// Drives one operation through the retry policy.
#[derive(Debug, Clone)]
pub struct Retrier<S = TokioSleeper> {
    policy: RetryPolicy,
    sleeper: S,
    cancel: Option<CancellationToken>,
}

impl Retrier<TokioSleeper> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: TokioSleeper,
            cancel: None,
        }
    }
}

impl<S: Sleeper> Retrier<S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Retrier<S2> {
        Retrier {
            policy: self.policy,
            sleeper,
            cancel: self.cancel,
        }
    }

    /// Stop retrying (not mid-attempt) once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Sleeps for `delay`; returns false if cancelled first.
    async fn pause(&self, delay: Duration) -> bool {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => false,
                    _ = self.sleeper.sleep(delay) => true,
                }
            }
            None => {
                self.sleeper.sleep(delay).await;
                true
            }
        }
    }

    pub async fn run<T, E, F, Fut>(&self, op: F) -> RetryReport<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RemoteFailure,
    {
        self.run_observed(op, |_| {}).await
    }

    /// Like [`Retrier::run`], reporting every attempt transition to `observe`.
    pub async fn run_observed<T, E, F, Fut, O>(&self, mut op: F, mut observe: O) -> RetryReport<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RemoteFailure,
        O: FnMut(AttemptEvent),
    {
        let mut attempt = 1u32;
        loop {
            observe(AttemptEvent::Started { attempt });
            let err = match op().await {
                Ok(value) => {
                    return RetryReport {
                        result: Ok(value),
                        attempts: attempt,
                        class: None,
                        cancelled: false,
                    }
                }
                Err(e) => e,
            };

            let class = classify(&err);
            let delay = match self.policy.decide(attempt, class) {
                RetryDecision::NoRetry => {
                    tracing::debug!(
                        attempt,
                        class = %class,
                        error = %err.message(),
                        "giving up"
                    );
                    return RetryReport {
                        result: Err(err),
                        attempts: attempt,
                        class: Some(class),
                        cancelled: false,
                    };
                }
                RetryDecision::RetryAfter(d) => d,
            };

            if self.is_cancelled() {
                return RetryReport {
                    result: Err(err),
                    attempts: attempt,
                    class: Some(class),
                    cancelled: true,
                };
            }

            tracing::warn!(
                attempt,
                class = %class,
                delay_ms = delay.as_millis() as u64,
                error = %err.message(),
                "attempt failed, retrying"
            );
            observe(AttemptEvent::Retrying {
                attempt,
                class,
                delay,
            });

            if !self.pause(delay).await {
                return RetryReport {
                    result: Err(err),
                    attempts: attempt,
                    class: Some(class),
                    cancelled: true,
                };
            }
            attempt += 1;
        }
    }
}

/// Runs an async operation until it succeeds or the retry policy says to stop.
/// The returned error is the one from the last attempt, unchanged.
pub async fn run_with_retry<T, E, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RemoteFailure,
{
    Retrier::new(*policy).run(op).await.result
}

/// Blocking equivalent of [`run_with_retry`].
/// On retryable failure, sleeps the thread for the backoff duration then tries again.
pub fn run_with_retry_blocking<T, E, F>(policy: &RetryPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: RemoteFailure,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, classify(&e)) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    std::thread::sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
