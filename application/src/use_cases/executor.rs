//! Parallel task executor
//!
//! Fans a batch of task futures out onto a [`JoinSet`] and fans their
//! outcomes back in by ordinal. A failing, timed-out or panicking task
//! settles as `Failure` in its own slot; siblings keep running and the batch
//! returns only once every slot has settled.

use council_domain::{FailureKind, TaskFailure, TaskOutcome};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Hooks called as tasks of a batch start and settle
pub trait BatchObserver: Send + Sync {
    /// A task acquired its concurrency slot and is about to run
    fn on_task_start(&self, _index: usize) {}

    /// A task reached a terminal state
    fn on_task_settled(&self, _index: usize, _success: bool) {}
}

/// Observer that ignores every event
pub struct NoObserver;

impl BatchObserver for NoObserver {}

/// Runs batches of independent tasks concurrently
#[derive(Debug, Clone, Default)]
pub struct ParallelTaskExecutor {
    max_concurrency: Option<usize>,
    task_timeout: Option<Duration>,
}

impl ParallelTaskExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of tasks running at once (`None` = unbounded)
    pub fn with_max_concurrency(mut self, max: Option<usize>) -> Self {
        self.max_concurrency = max.map(|n| n.max(1));
        self
    }

    /// Fail tasks that do not settle within `timeout`
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Run every task to a terminal state.
    ///
    /// The returned outcomes are indexed like `tasks`, independent of
    /// completion order. Once `cancel` fires, tasks that have not settled
    /// are dropped and recorded as `Cancelled`.
    pub async fn run_batch<R, F>(
        &self,
        tasks: Vec<F>,
        cancel: &CancellationToken,
        observer: Arc<dyn BatchObserver>,
    ) -> Vec<TaskOutcome<R>>
    where
        F: Future<Output = TaskOutcome<R>> + Send + 'static,
        R: Send + 'static,
    {
        let total = tasks.len();
        let semaphore = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let mut join_set = JoinSet::new();
        let mut slots = HashMap::with_capacity(total);

        debug!(
            "Spawning batch of {} tasks (cap: {:?}, timeout: {:?})",
            total, self.max_concurrency, self.task_timeout
        );

        for (index, task) in tasks.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let observer = observer.clone();
            let timeout = self.task_timeout;

            let handle = join_set.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            observer.on_task_settled(index, false);
                            return (index, TaskOutcome::Failure(TaskFailure::cancelled()));
                        }
                        permit = semaphore.acquire_owned() => permit.ok(),
                    },
                    None => None,
                };

                observer.on_task_start(index);
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => TaskOutcome::Failure(TaskFailure::cancelled()),
                    outcome = run_with_timeout(task, timeout) => outcome,
                };
                observer.on_task_settled(index, outcome.is_success());
                (index, outcome)
            });
            slots.insert(handle.id(), index);
        }

        let mut outcomes: Vec<Option<TaskOutcome<R>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, (index, outcome))) => outcomes[index] = Some(outcome),
                Err(e) => {
                    warn!("Task join error: {}", e);
                    if let Some(&index) = slots.get(&e.id()) {
                        observer.on_task_settled(index, false);
                        outcomes[index] = Some(TaskOutcome::failure(
                            FailureKind::Aborted,
                            format!("task aborted: {}", e),
                        ));
                    }
                }
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| {
                    TaskOutcome::failure(FailureKind::Aborted, "task never settled")
                })
            })
            .collect()
    }
}

async fn run_with_timeout<R, F>(task: F, timeout: Option<Duration>) -> TaskOutcome<R>
where
    F: Future<Output = TaskOutcome<R>>,
{
    match timeout {
        Some(after) => match tokio::time::timeout(after, task).await {
            Ok(outcome) => outcome,
            Err(_) => TaskOutcome::Failure(TaskFailure::timeout(after)),
        },
        None => task.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn ok_after(ms: u64, value: usize) -> impl Future<Output = TaskOutcome<usize>> + Send {
        async move {
            sleep(Duration::from_millis(ms)).await;
            TaskOutcome::Success(value)
        }
    }

    async fn explode() -> TaskOutcome<usize> {
        panic!("agent exploded")
    }

    #[derive(Default)]
    struct RecordingObserver {
        settled: Mutex<Vec<(usize, bool)>>,
        running: AtomicUsize,
        max_running: AtomicUsize,
    }

    impl BatchObserver for RecordingObserver {
        fn on_task_start(&self, _index: usize) {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);
        }

        fn on_task_settled(&self, index: usize, success: bool) {
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.settled.lock().unwrap().push((index, success));
        }
    }

    // ==================== Ordering Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_results_are_index_stable() {
        let executor = ParallelTaskExecutor::new();
        let tasks: Vec<_> = [30, 10, 20]
            .into_iter()
            .enumerate()
            .map(|(i, ms)| Box::pin(ok_after(ms, i)))
            .collect();

        let observer = Arc::new(RecordingObserver::default());
        let outcomes = executor
            .run_batch(tasks, &CancellationToken::new(), observer.clone())
            .await;

        let values: Vec<_> = outcomes.into_iter().map(|o| o.into_result().unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2]);

        let settle_order: Vec<_> = observer.settled.lock().unwrap().iter().map(|s| s.0).collect();
        assert_eq!(settle_order, vec![1, 2, 0]);
    }

    // ==================== Failure Isolation Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_abort_siblings() {
        let executor = ParallelTaskExecutor::new();
        let tasks: Vec<std::pin::Pin<Box<dyn Future<Output = TaskOutcome<usize>> + Send>>> = vec![
            Box::pin(async { TaskOutcome::<usize>::failure(FailureKind::Transient, "boom") }),
            Box::pin(ok_after(50, 1)),
        ];

        let outcomes = executor
            .run_batch(tasks, &CancellationToken::new(), Arc::new(NoObserver))
            .await;

        assert_eq!(outcomes[0].as_failure().unwrap().kind, FailureKind::Transient);
        assert_eq!(outcomes[1], TaskOutcome::Success(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_only_slow_task() {
        let executor = ParallelTaskExecutor::new().with_task_timeout(Some(Duration::from_secs(1)));
        let tasks = vec![Box::pin(ok_after(5_000, 0)), Box::pin(ok_after(10, 1))];

        let outcomes = executor
            .run_batch(tasks, &CancellationToken::new(), Arc::new(NoObserver))
            .await;

        assert_eq!(outcomes[0].as_failure().unwrap().kind, FailureKind::Timeout);
        assert_eq!(outcomes[1], TaskOutcome::Success(1));
    }

    #[tokio::test]
    async fn test_panic_is_mapped_to_its_slot() {
        let executor = ParallelTaskExecutor::new();
        let tasks: Vec<std::pin::Pin<Box<dyn Future<Output = TaskOutcome<usize>> + Send>>> = vec![
            Box::pin(async { TaskOutcome::Success(0) }),
            Box::pin(explode()),
        ];

        let observer = Arc::new(RecordingObserver::default());
        let outcomes = executor
            .run_batch(tasks, &CancellationToken::new(), observer.clone())
            .await;

        assert_eq!(outcomes[0], TaskOutcome::Success(0));
        assert_eq!(outcomes[1].as_failure().unwrap().kind, FailureKind::Aborted);
        assert!(observer.settled.lock().unwrap().contains(&(1, false)));
    }

    // ==================== Concurrency Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_is_respected() {
        let executor = ParallelTaskExecutor::new().with_max_concurrency(Some(2));
        let tasks: Vec<_> = (0..6).map(|i| Box::pin(ok_after(100, i))).collect();
        let observer = Arc::new(RecordingObserver::default());

        let outcomes = executor
            .run_batch(tasks, &CancellationToken::new(), observer.clone())
            .await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(|o| o.is_success()));
        assert_eq!(observer.max_running.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_tasks_start_without_cap() {
        let executor = ParallelTaskExecutor::new();
        let tasks: Vec<_> = (0..5).map(|i| Box::pin(ok_after(100, i))).collect();
        let observer = Arc::new(RecordingObserver::default());

        executor
            .run_batch(tasks, &CancellationToken::new(), observer.clone())
            .await;

        assert_eq!(observer.max_running.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_settles_pending_tasks() {
        let executor = ParallelTaskExecutor::new();
        let cancel = CancellationToken::new();
        let tasks = vec![Box::pin(ok_after(10, 0)), Box::pin(ok_after(10_000, 1))];

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let outcomes = executor.run_batch(tasks, &cancel, Arc::new(NoObserver)).await;

        assert_eq!(outcomes[0], TaskOutcome::Success(0));
        assert_eq!(outcomes[1].as_failure().unwrap().kind, FailureKind::Cancelled);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let executor = ParallelTaskExecutor::new();
        let outcomes: Vec<TaskOutcome<usize>> = executor
            .run_batch(
                Vec::<std::future::Ready<TaskOutcome<usize>>>::new(),
                &CancellationToken::new(),
                Arc::new(NoObserver),
            )
            .await;
        assert!(outcomes.is_empty());
    }
}
