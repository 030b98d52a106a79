//! Registry of background tasks spawned per turn.
//!
//! Grounding retrieval and strategy tips outlive the submission that started
//! them. Tracking them lets shutdown and tests wait for every tip to be
//! attached or discarded.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::{AbortHandle, JoinSet};

#[derive(Debug, Clone, Default)]
pub struct TipTracker {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl TipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawns `task` on the current runtime and keeps track of it.
    pub fn spawn<F>(&self, task: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks();
        // reap what already finished so the set does not grow unbounded
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task)
    }

    /// Tasks spawned and not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks().len()
    }

    /// Waits for every tracked task, including ones spawned while draining.
    pub async fn drain(&self) {
        loop {
            let mut batch = std::mem::take(&mut *self.tasks());
            if batch.is_empty() {
                return;
            }
            while let Some(result) = batch.join_next().await {
                if let Err(err) = result {
                    if err.is_panic() {
                        tracing::error!(error = %err, "Background negotiation task panicked");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn drain_waits_for_all_tasks() {
        let tracker = TipTracker::new();
        let done = Arc::new(AtomicUsize::new(0));

        for delay in [30u64, 10, 20] {
            let done = Arc::clone(&done);
            tracker.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        tracker.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn tasks_spawned_during_drain_are_awaited() {
        let tracker = TipTracker::new();
        let done = Arc::new(AtomicUsize::new(0));

        let inner_tracker = tracker.clone();
        let inner_done = Arc::clone(&done);
        tracker.spawn(async move {
            inner_tracker.spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                inner_done.fetch_add(1, Ordering::SeqCst);
            });
        });

        tracker.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn aborted_task_does_not_run_to_completion() {
        let tracker = TipTracker::new();
        let done = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&done);
        let handle = tracker.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });
        handle.abort();

        tracker.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }
}
