//! Per-operation states, terminal outcomes, and run summaries.
//!
//! The scheduler reports every state change as a [`ScheduleEvent`] so a CLI
//! can render progress; [`ScheduleSummary`] condenses the final outcomes.

use std::time::Duration;

use crate::retry::{FailureClass, RetryReport};

/// Where an operation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Queued,
    /// Holds a slot.
    Admitted,
    /// Attempt `n` (1-based) is running.
    Attempting(u32),
    /// Attempt `attempt` failed; waiting `delay` before the next.
    Retrying { attempt: u32, delay: Duration },
    Succeeded,
    FatallyFailed,
    /// Never admitted because the run was cancelled.
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationState::Succeeded | OperationState::FatallyFailed | OperationState::Cancelled
        )
    }
}

/// A state change for the operation at `index` (submission order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEvent {
    pub index: usize,
    pub state: OperationState,
}

/// Terminal result of one scheduled operation.
#[derive(Debug)]
pub enum OperationOutcome<T, E> {
    Succeeded {
        value: T,
        attempts: u32,
    },
    /// Error from the last attempt, unchanged.
    Failed {
        error: E,
        class: FailureClass,
        attempts: u32,
        /// Retrying stopped early because the run was cancelled.
        interrupted: bool,
    },
    /// Still queued when the run was cancelled; never invoked.
    Cancelled,
    /// The operation's task panicked.
    Panicked,
}

impl<T, E> OperationOutcome<T, E> {
    pub(crate) fn from_report(report: RetryReport<T, E>) -> Self {
        match report.result {
            Ok(value) => OperationOutcome::Succeeded {
                value,
                attempts: report.attempts,
            },
            Err(error) => OperationOutcome::Failed {
                error,
                class: report.class.unwrap_or(FailureClass::Unknown),
                attempts: report.attempts,
                interrupted: report.cancelled,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded { .. })
    }

    /// Number of times the operation was invoked (0 if never admitted).
    pub fn attempts(&self) -> u32 {
        match self {
            OperationOutcome::Succeeded { attempts, .. }
            | OperationOutcome::Failed { attempts, .. } => *attempts,
            OperationOutcome::Cancelled | OperationOutcome::Panicked => 0,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OperationOutcome::Succeeded { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            OperationOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Aggregate counts over a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub panicked: usize,
    /// Sum of attempts across all operations.
    pub attempts: u64,
}

impl ScheduleSummary {
    pub fn from_outcomes<T, E>(outcomes: &[OperationOutcome<T, E>]) -> Self {
        let mut summary = ScheduleSummary {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            summary.attempts += u64::from(outcome.attempts());
            match outcome {
                OperationOutcome::Succeeded { .. } => summary.succeeded += 1,
                OperationOutcome::Failed { .. } => summary.failed += 1,
                OperationOutcome::Cancelled => summary.cancelled += 1,
                OperationOutcome::Panicked => summary.panicked += 1,
            }
        }
        summary
    }

    /// Fraction of operations that succeeded, in [0.0, 1.0].
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.succeeded as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_each_outcome() {
        let outcomes: Vec<OperationOutcome<u32, &str>> = vec![
            OperationOutcome::Succeeded { value: 1, attempts: 3 },
            OperationOutcome::Failed {
                error: "nope",
                class: FailureClass::ClientFatal,
                attempts: 1,
                interrupted: false,
            },
            OperationOutcome::Cancelled,
            OperationOutcome::Panicked,
        ];
        let s = ScheduleSummary::from_outcomes(&outcomes);
        assert_eq!(s.total, 4);
        assert_eq!(s.succeeded, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.cancelled, 1);
        assert_eq!(s.panicked, 1);
        assert_eq!(s.attempts, 4);
        assert!((s.success_rate() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_rate_is_one() {
        let s = ScheduleSummary::from_outcomes::<(), ()>(&[]);
        assert_eq!(s.total, 0);
        assert!((s.success_rate() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn terminal_states() {
        assert!(OperationState::Succeeded.is_terminal());
        assert!(OperationState::Cancelled.is_terminal());
        assert!(!OperationState::Attempting(2).is_terminal());
        assert!(!OperationState::Queued.is_terminal());
    }
}
