use std::future::Future;
use std::mem;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

/// Single-shot restartable delay gate for one input stream.
///
/// Scheduling an action holds it back for the delay; scheduling again
/// within the window cancels the pending one, so only the last action
/// fires. The pending action is also cancelled on [`cancel`] and on drop.
///
/// [`cancel`]: Debouncer::cancel
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `action` to run after the delay, superseding any pending
    /// action.
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // The window opens at the call, not at the task's first poll.
        let deadline = Instant::now() + self.delay;
        let handle = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            action.await;
        });
        if let Some(previous) = self.replace(Some(handle)) {
            tracing::debug!("superseding a pending debounced action");
            previous.abort();
        }
    }

    /// Cancels the pending action, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.replace(None) {
            previous.abort();
        }
    }

    fn replace(&self, next: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut guard = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        mem::replace(&mut *guard, next)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    fn recorder() -> Arc<StdMutex<Vec<&'static str>>> {
        Arc::new(StdMutex::new(Vec::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_action_in_a_window_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let log = recorder();

        for entry in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            debouncer.schedule(async move { log.lock().unwrap().push(entry) });
        }

        time::advance(Duration::from_millis(999)).await;
        tokio::task::yield_now().await;
        assert!(log.lock().unwrap().is_empty());

        time::advance(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(*log.lock().unwrap(), vec!["c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_actions_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let log = recorder();

        for entry in ["a", "b"] {
            let log = Arc::clone(&log);
            debouncer.schedule(async move { log.lock().unwrap().push(entry) });
            time::advance(Duration::from_millis(150)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_the_pending_action() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let log = recorder();

        {
            let log = Arc::clone(&log);
            debouncer.schedule(async move { log.lock().unwrap().push("a") });
        }
        debouncer.cancel();

        time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert!(log.lock().unwrap().is_empty());
    }
}
