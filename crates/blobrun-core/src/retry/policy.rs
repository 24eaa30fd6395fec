use rand::Rng;
use std::time::Duration;

/// High-level classification of a failure for retry purposes.
///
/// Callers never build these directly; `classify` maps messages, status
/// codes and transient markers into one of these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Connection refused/reset, timeout, or an explicit retryable marker.
    NetworkTransient,
    /// Server asked us to slow down (429).
    RateLimited,
    /// 5xx from the remote side.
    ServerTransient,
    /// 4xx other than 429. Never retried.
    ClientFatal,
    /// Nothing recognizable. Retried.
    Unknown,
}

impl FailureClass {
    /// Whether a failure of this class may be attempted again.
    pub fn is_retryable(self) -> bool {
        !matches!(self, FailureClass::ClientFatal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::NetworkTransient => "network-transient",
            FailureClass::RateLimited => "rate-limited",
            FailureClass::ServerTransient => "server-transient",
            FailureClass::ClientFatal => "client-fatal",
            FailureClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Random extra delay added on top of the exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Deterministic delays.
    None,
    /// Uniform in `[0, base_delay)`.
    #[default]
    UpToBase,
    /// Uniform in `[0, ceiling)`.
    UpTo(Duration),
}

/// Exponential backoff policy with caps and optional jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay (before jitter).
    pub max_delay: Duration,
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: Jitter::UpToBase,
        }
    }
}

/// `min(base * 2^(attempt-1), max)`, saturating instead of overflowing.
///
/// `attempt` is 1-based; attempt 0 is treated as 1.
pub fn next_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exp = attempt.saturating_sub(1);
    let raw = match 1u32.checked_shl(exp) {
        Some(factor) => base.saturating_mul(factor),
        None => Duration::MAX,
    };
    raw.min(max)
}

impl RetryPolicy {
    /// Policy with deterministic delays; handy for tests and baselines.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = Jitter::None;
        self
    }

    /// Effective attempt budget; zero is treated as a single attempt.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff delay before the attempt after `attempt`, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        next_delay(attempt, self.base_delay, self.max_delay)
    }

    fn jitter_ceiling(&self) -> Duration {
        match self.jitter {
            Jitter::None => Duration::ZERO,
            Jitter::UpToBase => self.base_delay,
            Jitter::UpTo(ceiling) => ceiling,
        }
    }

    /// Adds the configured random jitter to `delay`.
    pub fn apply_jitter(&self, delay: Duration) -> Duration {
        let ceiling = self.jitter_ceiling();
        if ceiling.is_zero() {
            return delay;
        }
        let nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
        let extra = rand::rng().random_range(0..nanos);
        delay.saturating_add(Duration::from_nanos(extra))
    }

    /// Decide what to do after attempt number `attempt` failed with `class`.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `RetryDecision::NoRetry`
    /// when the class is fatal or the attempt budget is spent.
    pub fn decide(&self, attempt: u32, class: FailureClass) -> RetryDecision {
        if attempt >= self.attempt_budget() || !class.is_retryable() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.apply_jitter(self.backoff(attempt)))
    }
}
