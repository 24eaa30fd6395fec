//! `blobrun simulate` – run simulated remote operations through the scheduler.

use anyhow::{Context, Result};
use blobrun_core::config::RunnerConfig;
use blobrun_core::retry::{Jitter, OperationError, RetryPolicy};
use blobrun_core::scheduler::{
    OperationOutcome, OperationState, ScheduleEvent, ScheduleSummary, Scheduler,
};
use blobrun_core::sim::{FailureMode, FlakyRemote, StoredBlob};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SimulateArgs {
    pub ops: usize,
    pub jobs: Option<usize>,
    pub failures: u32,
    pub mode: FailureMode,
    pub latency_ms: u64,
    pub fatal: Vec<usize>,
    pub max_attempts: Option<u32>,
    pub no_jitter: bool,
}

fn effective_policy(cfg: &RunnerConfig, args: &SimulateArgs) -> RetryPolicy {
    let mut policy = cfg.retry_policy();
    if let Some(n) = args.max_attempts {
        policy.max_attempts = n;
    }
    if args.no_jitter {
        policy.jitter = Jitter::None;
    }
    policy
}

fn build_remotes(args: &SimulateArgs) -> Vec<FlakyRemote> {
    let latency = Duration::from_millis(args.latency_ms);
    (0..args.ops)
        .map(|i| {
            if args.fatal.contains(&i) {
                FlakyRemote::new(i, 0, FailureMode::Fatal, latency)
            } else {
                FlakyRemote::new(i, args.failures, args.mode, latency)
            }
        })
        .collect()
}

/// One progress line for an event, or `None` for events not worth printing.
pub(crate) fn describe_event(event: &ScheduleEvent) -> Option<String> {
    let op = event.index;
    match event.state {
        OperationState::Retrying { attempt, delay } => Some(format!(
            "  op {}: attempt {} failed, retrying in {} ms",
            op,
            attempt,
            delay.as_millis()
        )),
        OperationState::Succeeded => Some(format!("  op {}: done", op)),
        OperationState::FatallyFailed => Some(format!("  op {}: failed", op)),
        OperationState::Cancelled => Some(format!("  op {}: cancelled", op)),
        OperationState::Queued | OperationState::Admitted | OperationState::Attempting(_) => None,
    }
}

/// Final report line for one operation.
pub(crate) fn describe_outcome(
    index: usize,
    outcome: &OperationOutcome<StoredBlob, OperationError>,
) -> String {
    match outcome {
        OperationOutcome::Succeeded { value, attempts } => format!(
            "[{}] ok       {} ({} attempt{})",
            index,
            value.receipt,
            attempts,
            if *attempts == 1 { "" } else { "s" }
        ),
        OperationOutcome::Failed {
            error,
            class,
            attempts,
            interrupted,
        } => format!(
            "[{}] failed   {} [{}] after {} attempt{}{}",
            index,
            error,
            class,
            attempts,
            if *attempts == 1 { "" } else { "s" },
            if *interrupted { ", interrupted" } else { "" }
        ),
        OperationOutcome::Cancelled => format!("[{}] cancelled before start", index),
        OperationOutcome::Panicked => format!("[{}] panicked", index),
    }
}

pub async fn run_simulate(cfg: &RunnerConfig, args: &SimulateArgs) -> Result<()> {
    if args.ops == 0 {
        anyhow::bail!("--ops must be at least 1");
    }
    let policy = effective_policy(cfg, args);
    let jobs = args.jobs.unwrap_or(cfg.concurrency_limit);
    let remotes = build_remotes(args);

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<ScheduleEvent>();
    let scheduler = Scheduler::new(policy, jobs).with_events(event_tx);
    println!(
        "Submitting {} operations, {} at a time (max {} attempts each). Ctrl-C cancels.",
        remotes.len(),
        scheduler.concurrency_limit(),
        scheduler.policy().attempt_budget()
    );

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let Some(line) = describe_event(&event) {
                println!("{}", line);
            }
        }
    });

    let token = scheduler.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling run");
            token.cancel();
        }
    });

    let start = Instant::now();
    let outcomes = scheduler
        .schedule(remotes.iter().map(|r| r.operation()))
        .await;
    let elapsed = start.elapsed();
    ctrl_c.abort();
    drop(scheduler);
    printer.await.context("progress printer join")?;

    println!();
    for (i, outcome) in outcomes.iter().enumerate() {
        println!("{}", describe_outcome(i, outcome));
    }
    let summary = ScheduleSummary::from_outcomes(&outcomes);
    println!(
        "\n{} succeeded, {} failed, {} cancelled; {} attempts in {:.2}s",
        summary.succeeded,
        summary.failed,
        summary.cancelled,
        summary.attempts,
        elapsed.as_secs_f64()
    );

    let unsuccessful = summary.total - summary.succeeded;
    if unsuccessful > 0 {
        anyhow::bail!("{} of {} operations did not succeed", unsuccessful, summary.total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobrun_core::retry::FailureClass;

    fn args() -> SimulateArgs {
        SimulateArgs {
            ops: 3,
            jobs: None,
            failures: 1,
            mode: FailureMode::Unavailable,
            latency_ms: 0,
            fatal: vec![1],
            max_attempts: Some(2),
            no_jitter: true,
        }
    }

    #[test]
    fn flags_override_config_policy() {
        let policy = effective_policy(&RunnerConfig::default(), &args());
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.jitter, Jitter::None);
        assert_eq!(policy.base_delay, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn fatal_indices_get_fatal_remotes() {
        let remotes = build_remotes(&args());
        assert_eq!(remotes.len(), 3);
        assert_eq!(remotes[1].store().await.unwrap_err().status, Some(404));
        assert_eq!(remotes[0].store().await.unwrap_err().status, Some(503));
        assert!(remotes[0].store().await.is_ok());
    }

    #[test]
    fn event_lines() {
        let retry = ScheduleEvent {
            index: 2,
            state: OperationState::Retrying {
                attempt: 1,
                delay: Duration::from_millis(150),
            },
        };
        assert_eq!(
            describe_event(&retry).unwrap(),
            "  op 2: attempt 1 failed, retrying in 150 ms"
        );
        let queued = ScheduleEvent {
            index: 0,
            state: OperationState::Queued,
        };
        assert!(describe_event(&queued).is_none());
    }

    #[test]
    fn outcome_lines() {
        let ok: OperationOutcome<StoredBlob, OperationError> = OperationOutcome::Succeeded {
            value: StoredBlob {
                remote: 0,
                attempt: 1,
                receipt: "sim-0000-1".to_string(),
            },
            attempts: 1,
        };
        assert_eq!(describe_outcome(0, &ok), "[0] ok       sim-0000-1 (1 attempt)");

        let failed: OperationOutcome<StoredBlob, OperationError> = OperationOutcome::Failed {
            error: OperationError::with_status("blob not found", 404),
            class: FailureClass::ClientFatal,
            attempts: 1,
            interrupted: false,
        };
        assert_eq!(
            describe_outcome(1, &failed),
            "[1] failed   blob not found (status 404) [client-fatal] after 1 attempt"
        );
    }
}
