//! Single-slot debounce timer.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Quiet window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Holds at most one pending flush. Every `schedule` call restarts the wait,
/// so a steady stream of calls postpones the flush indefinitely.
pub struct DebounceScheduler {
    runtime: Handle,
    pending: Option<JoinHandle<()>>,
    deadline: Option<Instant>,
}

impl DebounceScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: None,
            deadline: None,
        }
    }

    /// Cancel any pending timer and arm a new one that runs `flush` after `delay`.
    ///
    /// `flush` runs synchronously once the timer expires. Work it hands off to
    /// other tasks is not affected by later `schedule` or `cancel` calls.
    pub fn schedule<F>(&mut self, delay: Duration, flush: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.deadline = Some(Instant::now() + delay);
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            flush();
        }));
    }

    /// Drop the pending timer, if any, without running it.
    pub fn cancel(&mut self) {
        self.deadline = None;
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Cancelling pending flush");
            }
            handle.abort();
        }
    }

    /// Whether a timer is waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Time left before the armed timer fires, or `None` when nothing is armed.
    pub fn remaining(&self) -> Option<Duration> {
        if !self.is_armed() {
            return None;
        }
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
