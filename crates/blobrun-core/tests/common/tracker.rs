//! Instrumented operations: record invocation order and concurrent activity.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use blobrun_core::OperationError;

pub type OpFuture = Pin<Box<dyn Future<Output = Result<u32, OperationError>> + Send>>;
pub type Op = Box<dyn FnMut() -> OpFuture + Send>;

#[derive(Default)]
pub struct Tracker {
    active: AtomicUsize,
    max_active: AtomicUsize,
    invocations: Mutex<Vec<usize>>,
}

impl Tracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self, index: usize) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.invocations.lock().unwrap().push(index);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// Highest number of operations observed running at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Operation index of every invocation, in the order they started.
    pub fn invocations(&self) -> Vec<usize> {
        self.invocations.lock().unwrap().clone()
    }

    /// Index of each operation's first invocation, in start order.
    pub fn first_starts(&self) -> Vec<usize> {
        let mut seen = Vec::new();
        for i in self.invocations() {
            if !seen.contains(&i) {
                seen.push(i);
            }
        }
        seen
    }

    pub fn calls_for(&self, index: usize) -> usize {
        self.invocations().iter().filter(|&&i| i == index).count()
    }

    /// Operation `index` that takes `duration` per call and returns the
    /// scripted results in order (the last entry repeats).
    pub fn op(
        self: &Arc<Self>,
        index: usize,
        duration: Duration,
        script: Vec<Result<u32, OperationError>>,
    ) -> Op {
        assert!(!script.is_empty());
        let tracker = Arc::clone(self);
        let mut call = 0usize;
        Box::new(move || -> OpFuture {
            let tracker = Arc::clone(&tracker);
            let result = script[call.min(script.len() - 1)].clone();
            call += 1;
            Box::pin(async move {
                tracker.enter(index);
                tokio::time::sleep(duration).await;
                tracker.exit();
                result
            })
        })
    }
}

pub fn ok(v: u32) -> Result<u32, OperationError> {
    Ok(v)
}

pub fn status(code: u16) -> Result<u32, OperationError> {
    Err(OperationError::with_status(format!("status {}", code), code))
}
