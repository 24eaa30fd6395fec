//! Tests for the simulate subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand, SimMode};
use clap::Parser;
use blobrun_core::sim::FailureMode;

#[test]
fn cli_parse_simulate_defaults() {
    match parse(&["blobrun", "simulate"]) {
        CliCommand::Simulate {
            ops,
            jobs,
            failures,
            mode,
            latency_ms,
            fatal,
            max_attempts,
            no_jitter,
        } => {
            assert_eq!(ops, 5);
            assert!(jobs.is_none());
            assert_eq!(failures, 2);
            assert_eq!(mode, SimMode::Mixed);
            assert_eq!(latency_ms, 200);
            assert!(fatal.is_empty());
            assert!(max_attempts.is_none());
            assert!(!no_jitter);
        }
        _ => panic!("expected Simulate"),
    }
}

#[test]
fn cli_parse_simulate_flags() {
    match parse(&[
        "blobrun",
        "simulate",
        "--ops",
        "8",
        "--jobs",
        "3",
        "--mode",
        "rate-limited",
        "--fatal",
        "1,3",
        "--max-attempts",
        "2",
        "--no-jitter",
    ]) {
        CliCommand::Simulate {
            ops,
            jobs,
            mode,
            fatal,
            max_attempts,
            no_jitter,
            ..
        } => {
            assert_eq!(ops, 8);
            assert_eq!(jobs, Some(3));
            assert_eq!(mode, SimMode::RateLimited);
            assert_eq!(fatal, vec![1, 3]);
            assert_eq!(max_attempts, Some(2));
            assert!(no_jitter);
        }
        _ => panic!("expected Simulate with flags"),
    }
}

#[test]
fn cli_parse_simulate_rejects_unknown_mode() {
    assert!(Cli::try_parse_from(["blobrun", "simulate", "--mode", "flaky"]).is_err());
}

#[test]
fn sim_mode_maps_to_failure_mode() {
    assert_eq!(FailureMode::from(SimMode::Refused), FailureMode::Refused);
    assert_eq!(FailureMode::from(SimMode::Unavailable), FailureMode::Unavailable);
    assert_eq!(FailureMode::from(SimMode::Mixed), FailureMode::Mixed);
}
