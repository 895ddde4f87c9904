//! Trailing-edge debouncing on the tokio timer.
//!
//! Each trigger aborts the pending task (if any) and spawns a new one that
//! sleeps for the delay and then runs the action with that trigger's
//! argument. Bursts therefore collapse into one run, after the burst goes
//! quiet, carrying the last argument.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay used to coalesce window move events before persisting the origin.
pub const MOVE_PERSIST_DELAY: Duration = Duration::from_millis(2000);

/// Debounces calls to an action taking `T`.
///
/// There is no flush: a pending run is simply dropped along with the
/// runtime at process exit.
pub struct Debouncer<T> {
    action: Arc<dyn Fn(T) + Send + Sync>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Wrap `action` so it runs `delay` after the last trigger.
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            delay,
            pending: None,
        }
    }

    /// Schedule the action with `arg`, superseding any pending run.
    ///
    /// Must be called from within a tokio runtime.
    pub fn trigger(&mut self, arg: T) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        let action = Arc::clone(&self.action);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(arg);
        }));
    }

    /// Whether a scheduled run has not happened yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
