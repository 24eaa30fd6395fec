//! Admission slots shared by everything one scheduler runs.
//!
//! An operation holds a slot from its first attempt until it reaches a
//! terminal state, so the number of operations in flight stays under the
//! configured concurrency limit. Waiters are served in request order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed-size pool of admission slots with instrumented counters.
#[derive(Debug)]
pub struct SlotPool {
    limit: usize,
    semaphore: Arc<Semaphore>,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl SlotPool {
    /// Create a pool with `limit` slots (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of slots currently held.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Free slots right now. May be 0 while every slot is held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Highest number of slots ever held at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    fn admit(self: &Arc<Self>, permit: OwnedSemaphorePermit) -> Slot {
        let now = self.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        Slot {
            pool: Arc::clone(self),
            _permit: permit,
        }
    }

    /// Wait for a free slot. Waiters are woken in FIFO order.
    /// Returns `None` only if the pool was closed.
    pub async fn acquire(self: &Arc<Self>) -> Option<Slot> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
        Some(self.admit(permit))
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(self: &Arc<Self>) -> Option<Slot> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        Some(self.admit(permit))
    }
}

/// A held admission slot; released exactly once when dropped.
#[derive(Debug)]
pub struct Slot {
    pool: Arc<SlotPool>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for Slot {
    fn drop(&mut self) {
        // The permit field drops after this, returning the semaphore slot.
        self.pool.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_track_counters() {
        let pool = Arc::new(SlotPool::new(2));
        assert_eq!(pool.available(), 2);
        let a = pool.try_acquire().expect("first slot");
        let b = pool.try_acquire().expect("second slot");
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.available(), 0);
        assert!(pool.try_acquire().is_none());
        drop(a);
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.peak(), 2);
    }

    #[test]
    fn zero_limit_is_one() {
        let pool = Arc::new(SlotPool::new(0));
        assert_eq!(pool.limit(), 1);
        let _s = pool.try_acquire().expect("one slot");
        assert!(pool.try_acquire().is_none());
    }

    #[tokio::test]
    async fn waiters_are_served_in_request_order() {
        let pool = Arc::new(SlotPool::new(1));
        let held = pool.acquire().await.expect("slot");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut handles = Vec::new();
        for i in 0..3 {
            let pool = Arc::clone(&pool);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let slot = pool.acquire().await.expect("slot");
                tx.send(i).unwrap();
                drop(slot);
            }));
            // Let the task register as a waiter before spawning the next.
            tokio::task::yield_now().await;
        }
        drop(tx);
        drop(held);
        for h in handles {
            h.await.unwrap();
        }
        let mut order = Vec::new();
        while let Some(i) = rx.recv().await {
            order.push(i);
        }
        assert_eq!(order, vec![0, 1, 2]);
    }
}
