//! Single-flight refresh coordination
//!
//! [`RefreshCoordinator`] owns the refresh-in-progress flag and the
//! [`PendingQueue`]. Exactly one caller at a time is handed a
//! [`RefreshGuard`]; everyone else gets a [`Waiter`] that resolves when the
//! guard settles. The lock is never held across an `.await`.

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::pending::PendingQueue;

/// Why a token refresh did not produce a usable access token
///
/// `Clone` so the same failure can be delivered to every queued caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("Token refresh rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Token refresh request failed: {0}")]
    Network(String),

    #[error("Token refresh returned an unreadable body: {0}")]
    InvalidResponse(String),

    #[error("Credential storage failed during refresh: {0}")]
    Storage(String),

    #[error("Token refresh was abandoned before it settled")]
    Abandoned,
}

/// Result of one refresh cycle, shared by every waiter
pub type RefreshOutcome = Result<(), RefreshError>;

#[derive(Debug, Default)]
struct RefreshState {
    in_progress: bool,
    queue: PendingQueue,
    cycles: u64,
}

/// Refresh-in-progress flag plus the queue of callers waiting on it
///
/// One instance per API client; nothing here is process-global, so
/// independent clients can run side by side.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Role handed out by [`RefreshCoordinator::begin`]
#[derive(Debug)]
pub enum RefreshTicket<'a> {
    /// Caller must perform the refresh and settle the guard
    Leader(RefreshGuard<'a>),
    /// A refresh is already in flight; wait for its outcome
    Follower(Waiter),
}

impl RefreshCoordinator {
    /// Create an idle coordinator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the current refresh cycle or start a new one
    ///
    /// Checking and setting the flag happen under one lock, so two callers
    /// can never both become leader.
    pub fn begin(&self) -> RefreshTicket<'_> {
        let mut state = self.state.lock();

        if state.in_progress {
            let rx = state.queue.enqueue();
            debug!(pending = state.queue.len(), "Refresh in progress, queueing request");
            return RefreshTicket::Follower(Waiter { rx });
        }

        state.in_progress = true;
        state.cycles += 1;
        debug!(cycle = state.cycles, "Starting token refresh");

        RefreshTicket::Leader(RefreshGuard { coordinator: self, settled: false })
    }

    /// Whether a refresh is currently in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_progress
    }

    /// Number of callers waiting on the in-flight refresh
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Number of refresh cycles started over the coordinator's lifetime
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.state.lock().cycles
    }

    /// Flush the queue, then clear the flag, in one critical section
    fn settle(&self, outcome: &RefreshOutcome) -> usize {
        let mut state = self.state.lock();
        let woken = state.queue.settle_all(outcome);
        state.in_progress = false;
        woken
    }
}

/// Leadership of one refresh cycle
///
/// Must be settled with [`RefreshGuard::finish`]. Dropping it unsettled (the
/// leader's future was cancelled) rejects every waiter with
/// [`RefreshError::Abandoned`] and frees the flag.
#[derive(Debug)]
#[must_use = "a refresh guard must be finished to wake queued requests"]
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    /// Deliver `outcome` to every waiter and end the cycle
    ///
    /// # Returns
    /// The same outcome, for the leader's own use
    pub fn finish(mut self, outcome: RefreshOutcome) -> RefreshOutcome {
        self.settled = true;
        let woken = self.coordinator.settle(&outcome);
        debug!(woken, success = outcome.is_ok(), "Refresh cycle settled");
        outcome
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let woken = self.coordinator.settle(&Err(RefreshError::Abandoned));
            warn!(woken, "Refresh leader dropped before settling");
        }
    }
}

/// Pending completion for a caller that queued behind a refresh
#[derive(Debug)]
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl Waiter {
    /// Wait for the in-flight refresh to settle
    pub async fn wait(self) -> RefreshOutcome {
        self.rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }
}
