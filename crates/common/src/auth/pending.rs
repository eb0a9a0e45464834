//! Pending-request queue
//!
//! Ordered list of deferred completions for requests that observed a refresh
//! already in flight. Every entry is settled exactly once, by
//! [`PendingQueue::settle_all`].

use tokio::sync::oneshot;

use super::refresh::RefreshOutcome;

/// Deferred completions waiting on the in-flight refresh
#[derive(Debug, Default)]
pub struct PendingQueue {
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

impl PendingQueue {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self { waiters: Vec::new() }
    }

    /// Append a completion slot and return the receiving half
    pub fn enqueue(&mut self) -> oneshot::Receiver<RefreshOutcome> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        rx
    }

    /// Resolve or reject every queued completion with `outcome`
    ///
    /// Drains the queue in insertion order. Waiters whose receiver was
    /// dropped (caller gave up) are skipped.
    ///
    /// # Returns
    /// Number of waiters that received the outcome
    pub fn settle_all(&mut self, outcome: &RefreshOutcome) -> usize {
        self.waiters
            .drain(..)
            .map(|waiter| waiter.send(outcome.clone()).is_ok())
            .filter(|delivered| *delivered)
            .count()
    }

    /// Number of queued completions
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Whether no completion is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}
