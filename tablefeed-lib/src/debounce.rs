//! Cancel-and-reschedule debounce timer.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Coalesces a burst of schedule calls into a single task run.
///
/// Each [`schedule`](Debouncer::schedule) cancels any pending timer and arms
/// a fresh one; only after the full window elapses with no further calls does
/// the most recently scheduled task run. Tasks run on the tokio runtime the
/// caller is on.
pub(crate) struct Debouncer {
    window: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `task` to run after the window of silence, replacing any
    /// previously pending task.
    pub async fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut pending = self.pending.lock().await;
            if let Some(previous) = pending.replace(token.clone()) {
                previous.cancel();
            }
        }

        let window = self.window;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(window) => task.await,
            }
        });
    }

    /// Cancels the pending task, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }
}
