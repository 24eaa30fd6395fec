//! Bounded concurrency scheduler.
//!
//! Admits at most N operations at a time from a FIFO submission queue, drives
//! each admitted operation through the retry policy, and collects one outcome
//! per operation in submission order.

mod outcome;
mod run;
mod slots;

pub use outcome::{OperationOutcome, OperationState, ScheduleEvent, ScheduleSummary};
pub use run::{schedule, Scheduler};
pub use slots::{Slot, SlotPool};
pub use tokio_util::sync::CancellationToken;
