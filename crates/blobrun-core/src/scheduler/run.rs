//! Run a batch of operations with at most N in flight.
//!
//! Operations are admitted in submission order; when one reaches a terminal
//! state its slot goes to the longest-waiting queued operation. Outcomes are
//! buffered by submission index and returned in that order.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::retry::{AttemptEvent, RemoteFailure, Retrier, RetryPolicy, Sleeper, TokioSleeper};

use super::outcome::{OperationOutcome, OperationState, ScheduleEvent, ScheduleSummary};
use super::slots::SlotPool;

/// Bounded-concurrency scheduler driving each operation through a retry policy.
///
/// Cloning shares the slot pool and the cancellation token, so clones running
/// batches at the same time share one concurrency limit.
#[derive(Debug, Clone)]
pub struct Scheduler<S = TokioSleeper> {
    policy: RetryPolicy,
    slots: Arc<SlotPool>,
    sleeper: S,
    cancel: CancellationToken,
    events: Option<UnboundedSender<ScheduleEvent>>,
}

impl Scheduler<TokioSleeper> {
    pub fn new(policy: RetryPolicy, concurrency_limit: usize) -> Self {
        Self {
            policy,
            slots: Arc::new(SlotPool::new(concurrency_limit)),
            sleeper: TokioSleeper,
            cancel: CancellationToken::new(),
            events: None,
        }
    }
}

fn emit(events: &Option<UnboundedSender<ScheduleEvent>>, index: usize, state: OperationState) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(ScheduleEvent { index, state });
    }
}

impl<S> Scheduler<S>
where
    S: Sleeper + Clone + 'static,
{
    pub fn with_sleeper<S2: Sleeper + Clone + 'static>(self, sleeper: S2) -> Scheduler<S2> {
        Scheduler {
            policy: self.policy,
            slots: self.slots,
            sleeper,
            cancel: self.cancel,
            events: self.events,
        }
    }

    /// Report every state transition on `tx`.
    pub fn with_events(mut self, tx: UnboundedSender<ScheduleEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Token that cancels this scheduler's runs: queued operations resolve as
    /// `Cancelled`, in-flight ones stop retrying after their current attempt.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn slots(&self) -> &Arc<SlotPool> {
        &self.slots
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn concurrency_limit(&self) -> usize {
        self.slots.limit()
    }

    fn retrier(&self) -> Retrier<S> {
        Retrier::new(self.policy)
            .with_sleeper(self.sleeper.clone())
            .with_cancellation(self.cancel.clone())
    }

    /// Runs every operation to a terminal state and returns one outcome per
    /// operation, in submission order. One operation's failure never affects
    /// another.
    pub async fn schedule<T, E, F, Fut, I>(&self, operations: I) -> Vec<OperationOutcome<T, E>>
    where
        I: IntoIterator<Item = F>,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: RemoteFailure + Send + 'static,
    {
        let mut queue: VecDeque<(usize, F)> = operations.into_iter().enumerate().collect();
        let total = queue.len();
        let mut outcomes: Vec<Option<OperationOutcome<T, E>>> = (0..total).map(|_| None).collect();
        for index in 0..total {
            emit(&self.events, index, OperationState::Queued);
        }
        tracing::debug!(
            total,
            limit = self.slots.limit(),
            "scheduling operations"
        );

        let mut join_set = JoinSet::new();

        while let Some((index, op)) = queue.pop_front() {
            let slot = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                slot = self.slots.acquire() => slot,
            };
            let Some(slot) = slot else {
                let cancelled = std::iter::once(index).chain(queue.drain(..).map(|(i, _)| i));
                for i in cancelled {
                    outcomes[i] = Some(OperationOutcome::Cancelled);
                    emit(&self.events, i, OperationState::Cancelled);
                }
                tracing::info!("run cancelled; queued operations dropped");
                break;
            };

            tracing::debug!(index, in_use = self.slots.in_use(), "admitted operation");
            emit(&self.events, index, OperationState::Admitted);

            let retrier = self.retrier();
            let events = self.events.clone();
            join_set.spawn(async move {
                let _slot = slot;
                let report = retrier
                    .run_observed(op, |event| {
                        let state = match event {
                            AttemptEvent::Started { attempt } => OperationState::Attempting(attempt),
                            AttemptEvent::Retrying { attempt, delay, .. } => {
                                OperationState::Retrying { attempt, delay }
                            }
                        };
                        emit(&events, index, state);
                    })
                    .await;
                let outcome = OperationOutcome::from_report(report);
                let terminal = if outcome.is_success() {
                    OperationState::Succeeded
                } else {
                    OperationState::FatallyFailed
                };
                emit(&events, index, terminal);
                (index, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!("operation task failed: {}", e),
            }
        }

        let outcomes: Vec<OperationOutcome<T, E>> = outcomes
            .into_iter()
            .map(|o| o.unwrap_or(OperationOutcome::Panicked))
            .collect();
        let summary = ScheduleSummary::from_outcomes(&outcomes);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            attempts = summary.attempts,
            "schedule finished"
        );
        outcomes
    }
}

/// Runs `operations` with at most `concurrency_limit` in flight, each retried
/// under `policy`. Outcomes come back in submission order.
pub async fn schedule<T, E, F, Fut, I>(
    operations: I,
    policy: &RetryPolicy,
    concurrency_limit: usize,
) -> Vec<OperationOutcome<T, E>>
where
    I: IntoIterator<Item = F>,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: RemoteFailure + Send + 'static,
{
    Scheduler::new(*policy, concurrency_limit)
        .schedule(operations)
        .await
}
