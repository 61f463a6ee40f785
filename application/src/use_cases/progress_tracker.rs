//! Progress tracker
//!
//! Keeps the live status map of one phase and coalesces writes to the
//! persistence gateway. Reports landing within the debounce window collapse
//! into a single [`SessionUpdate::Progress`] merge; the engine flushes
//! explicitly when the phase completes.
//!
//! ```text
//! report() ──> live map (read by snapshot())
//!          └─> pending map ──(debounce timer | flush())──> gateway.save(Progress)
//! ```

use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use council_domain::{ProgressScope, SessionId, SessionUpdate, TaskStatus};
use std::collections::BTreeMap;
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Default)]
struct Buffer {
    live: BTreeMap<String, TaskStatus>,
    pending: BTreeMap<String, TaskStatus>,
    timer_armed: bool,
}

struct Inner {
    session_id: SessionId,
    scope: ProgressScope,
    persistence: Arc<dyn PersistenceGateway>,
    debounce: Duration,
    buffer: Mutex<Buffer>,
    // Serializes flushes so an older batch can never land after a newer one
    flush_lock: tokio::sync::Mutex<()>,
}

/// Live per-task status of one phase with debounced persistence
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Inner>,
}

impl ProgressTracker {
    pub fn new(
        session_id: SessionId,
        scope: ProgressScope,
        persistence: Arc<dyn PersistenceGateway>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session_id,
                scope,
                persistence,
                debounce,
                buffer: Mutex::new(Buffer::default()),
                flush_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn scope(&self) -> ProgressScope {
        self.inner.scope
    }

    /// Record a status change.
    ///
    /// Visible to [`snapshot`](Self::snapshot) immediately; persisted by the
    /// next flush. Must be called from within a tokio runtime.
    pub fn report(&self, task_id: &str, status: TaskStatus) {
        let arm_timer = {
            let mut buffer = self.inner.buffer.lock().unwrap_or_else(|e| e.into_inner());
            buffer.live.insert(task_id.to_string(), status);
            buffer.pending.insert(task_id.to_string(), status);
            !mem::replace(&mut buffer.timer_armed, true)
        };

        if arm_timer {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                tokio::time::sleep(inner.debounce).await;
                if let Err(e) = inner.flush().await {
                    warn!("Debounced progress flush failed: {}", e);
                }
            });
        }
    }

    /// Most recent in-memory statuses, flushed or not
    pub fn snapshot(&self) -> BTreeMap<String, TaskStatus> {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .live
            .clone()
    }

    /// Write all pending reports now
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        self.inner.flush().await
    }
}

impl Inner {
    async fn flush(&self) -> Result<(), PersistenceError> {
        let _guard = self.flush_lock.lock().await;

        let pending = {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            buffer.timer_armed = false;
            mem::take(&mut buffer.pending)
        };
        if pending.is_empty() {
            return Ok(());
        }

        debug!(
            "Flushing {} {} status update(s) for {}",
            pending.len(),
            self.scope.as_str(),
            self.session_id
        );
        let update = SessionUpdate::progress(self.scope, pending.clone());
        if let Err(e) = self.persistence.save(&self.session_id, update).await {
            // Keep unsaved statuses for the next flush unless newer ones arrived
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            for (task_id, status) in pending {
                buffer.pending.entry(task_id).or_insert(status);
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::RecordingPersistence;
    use council_domain::{Question, SessionState, SharedContext};
    use tokio::time::sleep;

    async fn setup(debounce_ms: u64) -> (Arc<RecordingPersistence>, ProgressTracker) {
        let persistence = Arc::new(RecordingPersistence::new());
        let id = SessionId::new("session_test");
        persistence
            .save(
                &id,
                SessionUpdate::replace(SessionState::new(
                    id.clone(),
                    SharedContext::new(Question::try_new("Q?").unwrap()),
                    "t0",
                )),
            )
            .await
            .unwrap();
        persistence.clear_log();

        let tracker = ProgressTracker::new(
            id,
            ProgressScope::Execution,
            persistence.clone(),
            Duration::from_millis(debounce_ms),
        );
        (persistence, tracker)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_within_window_collapse_into_one_write() {
        let (persistence, tracker) = setup(350).await;

        tracker.report("A", TaskStatus::Running);
        tracker.report("B", TaskStatus::Running);
        sleep(Duration::from_millis(100)).await;
        tracker.report("A", TaskStatus::Done);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(persistence.progress_writes(), 0);

        sleep(Duration::from_millis(300)).await;
        assert_eq!(persistence.progress_writes(), 1);

        let state = persistence.stored(&SessionId::new("session_test")).unwrap();
        assert_eq!(state.execution_status["A"], TaskStatus::Done);
        assert_eq!(state.execution_status["B"], TaskStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reflects_unflushed_reports() {
        let (persistence, tracker) = setup(350).await;

        tracker.report("A", TaskStatus::Failed);

        assert_eq!(tracker.snapshot()["A"], TaskStatus::Failed);
        assert_eq!(persistence.progress_writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_flush_writes_immediately() {
        let (persistence, tracker) = setup(10_000).await;

        tracker.report("A", TaskStatus::Done);
        tracker.flush().await.unwrap();
        assert_eq!(persistence.progress_writes(), 1);

        // The armed timer finds nothing left to write
        sleep(Duration::from_secs(11)).await;
        assert_eq!(persistence.progress_writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_after_flush_arm_a_new_timer() {
        let (persistence, tracker) = setup(350).await;

        tracker.report("A", TaskStatus::Running);
        sleep(Duration::from_millis(400)).await;
        tracker.report("A", TaskStatus::Done);
        sleep(Duration::from_millis(400)).await;

        assert_eq!(persistence.progress_writes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_keeps_pending_statuses() {
        let (persistence, tracker) = setup(10_000).await;
        persistence.fail_saves(true);

        tracker.report("A", TaskStatus::Done);
        assert!(tracker.flush().await.is_err());

        persistence.fail_saves(false);
        tracker.flush().await.unwrap();
        let state = persistence.stored(&SessionId::new("session_test")).unwrap();
        assert_eq!(state.execution_status["A"], TaskStatus::Done);
    }
}
