//! Council engine
//!
//! Drives sessions through the phase pipeline. Every `start_*` operation
//! claims the session with an atomic compare-and-set, validates the phase
//! preconditions, and either reports the cached artifacts (`AlreadyDone`) or
//! spawns the phase and hands back a [`PhaseTicket`].
//!
//! ```text
//! start_execute ──CAS──> prepare ──spawn──> executor ──> tracker.flush ──> commit (Replace)
//!      │                    │
//!      └─ Conflict          └─ Validation / AlreadyDone
//! ```
//!
//! Artifacts of a phase are swapped in only when the phase completes, so a
//! cancelled or failed re-run leaves the previous artifacts intact.

use crate::config::EngineConfig;
use crate::ports::agent_invoker::AgentInvoker;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::agent_task::AgentTaskRunner;
use crate::use_cases::chairman::ChairmanSynthesizer;
use crate::use_cases::executor::{BatchObserver, ParallelTaskExecutor};
use crate::use_cases::peer_review::{PeerReviewAggregator, plan_reviews};
use crate::use_cases::progress_tracker::ProgressTracker;
use crate::use_cases::session_store::{Claim, PhaseGuard, SessionSlot, SessionStore};
use chrono::{SecondsFormat, Utc};
use council_domain::{
    AggregatedScore, ContextDocument, CostTotals, Council, CouncilPhase, DomainError,
    ExecutionSet, ExecutionTask, ModelPricing, PhaseKind, ProgressScope, ProposalId, Question,
    ReviewSet, ReviewTask, SCHEMA_VERSION, SessionId, SessionState, SessionSummary,
    SessionUpdate, SharedContext, TaskOutcome, TaskStatus,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors returned by engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    #[error("Session {session} is busy: {in_flight} already in flight")]
    ConcurrencyConflict { session: SessionId, in_flight: Claim },

    #[error("{phase} failed: {message}")]
    Upstream { phase: PhaseKind, message: String },

    #[error("{0} was cancelled")]
    Cancelled(PhaseKind),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl EngineError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::ConcurrencyConflict { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

/// Summary of a settled phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: PhaseKind,
    pub succeeded: usize,
    pub failed: usize,
}

/// Handle on a spawned phase
#[derive(Debug)]
pub struct PhaseTicket {
    phase: PhaseKind,
    handle: JoinHandle<Result<PhaseReport, EngineError>>,
}

impl PhaseTicket {
    pub fn phase(&self) -> PhaseKind {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the phase to settle.
    ///
    /// Resolves to `Upstream` when every task of the phase failed, even
    /// though the failed results were stored.
    pub async fn wait(self) -> Result<PhaseReport, EngineError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(EngineError::Upstream {
                phase: self.phase,
                message: format!("phase task aborted: {}", e),
            }),
        }
    }
}

/// Result of a `start_*` request that was not rejected
#[derive(Debug)]
pub enum StartOutcome {
    /// The phase was spawned
    Accepted(PhaseTicket),
    /// The phase's artifacts already exist and `force` was not set
    AlreadyDone,
}

impl StartOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, StartOutcome::Accepted(_))
    }

    pub fn into_ticket(self) -> Option<PhaseTicket> {
        match self {
            StartOutcome::Accepted(ticket) => Some(ticket),
            StartOutcome::AlreadyDone => None,
        }
    }
}

/// Result of installing or editing a council
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouncilOutcome {
    /// The council was recorded; `invalidated` lists the discarded phases
    Applied { invalidated: Vec<PhaseKind> },
    /// The same council is already in place
    AlreadyDone,
}

/// Phase and live task statuses of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub session_id: SessionId,
    pub phase: CouncilPhase,
    pub in_flight: Option<PhaseKind>,
    pub execution_status: BTreeMap<String, TaskStatus>,
    pub review_status: BTreeMap<String, TaskStatus>,
    pub cost: CostTotals,
    pub errors: Vec<String>,
}

/// Review tasks together with their aggregated scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewsReport {
    pub reviews: Vec<ReviewTask>,
    pub scores: BTreeMap<ProposalId, AggregatedScore>,
    /// The Review phase is still running and more reviews may arrive
    pub partial: bool,
}

/// The council orchestration engine
#[derive(Clone)]
pub struct CouncilEngine {
    runner: Arc<AgentTaskRunner>,
    persistence: Arc<dyn PersistenceGateway>,
    progress: Arc<dyn ProgressNotifier>,
    logger: Arc<dyn ConversationLogger>,
    store: Arc<SessionStore>,
    executor: ParallelTaskExecutor,
    pricing: ModelPricing,
    config: EngineConfig,
}

impl CouncilEngine {
    pub fn new(
        invoker: Arc<dyn AgentInvoker>,
        persistence: Arc<dyn PersistenceGateway>,
        config: EngineConfig,
    ) -> Self {
        let logger: Arc<dyn ConversationLogger> = Arc::new(NoConversationLogger);
        Self {
            runner: Arc::new(AgentTaskRunner::new(invoker, logger.clone())),
            persistence,
            progress: Arc::new(NoProgress),
            logger,
            store: Arc::new(SessionStore::new()),
            executor: ParallelTaskExecutor::new()
                .with_max_concurrency(config.max_concurrency)
                .with_task_timeout(config.task_timeout),
            pricing: ModelPricing::for_model(&config.pricing_model),
            config,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.runner = Arc::new(AgentTaskRunner::new(self.runner.invoker(), logger.clone()));
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Session Lifecycle ====================

    /// Create a session for a question and its background documents
    pub async fn create_session(
        &self,
        question: &str,
        documents: Vec<ContextDocument>,
    ) -> Result<SessionId, EngineError> {
        let question = Question::try_new(question)?;
        let id = generate_session_id();
        let state = SessionState::new(
            id.clone(),
            SharedContext::new(question).with_documents(documents),
            now(),
        );

        self.persistence
            .save(&id, SessionUpdate::replace(state.clone()))
            .await?;
        self.store.insert(SessionSlot::new(state, self.pricing));
        info!("Created session {}", id);
        Ok(id)
    }

    /// Load a persisted session into the store
    pub async fn open_session(&self, id: &SessionId) -> Result<SessionSummary, EngineError> {
        let slot = self.slot(id).await?;
        Ok(slot.read(SessionState::summary))
    }

    /// Drop a session from memory and storage, resetting its ledger
    pub async fn discard_session(&self, id: &SessionId) -> Result<(), EngineError> {
        if let Some(slot) = self.store.get(id) {
            let guard = slot
                .try_discard()
                .map_err(|in_flight| conflict(id, in_flight))?;
            self.store.remove(id);
            slot.ledger().reset();
            drop(guard);
        }
        self.persistence.delete(id).await?;
        info!("Discarded session {}", id);
        Ok(())
    }

    /// Summaries of all persisted sessions, newest first
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, EngineError> {
        let mut sessions = self.persistence.list().await?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Trip the cancellation token of the session's running phase.
    ///
    /// Returns `false` when no phase is in flight.
    pub async fn cancel(&self, id: &SessionId) -> Result<bool, EngineError> {
        let slot = self.slot(id).await?;
        let cancelled = slot.cancel();
        if cancelled {
            info!("Cancellation requested for session {}", id);
        }
        Ok(cancelled)
    }

    // ==================== Build / Edit ====================

    /// Record the council of a session (Build).
    ///
    /// An already built session is left untouched unless `force` is set, in
    /// which case every artifact derived from the old council is discarded.
    pub async fn install_council(
        &self,
        id: &SessionId,
        council: Council,
        force: bool,
    ) -> Result<CouncilOutcome, EngineError> {
        council.validate()?;
        let slot = self.slot(id).await?;
        let _guard = slot
            .try_begin(PhaseKind::Build)
            .map_err(|in_flight| conflict(id, in_flight))?;

        let staged = slot.read(|current| {
            if current.phase.is_complete(PhaseKind::Build) && !force {
                return None;
            }
            let mut state = current.clone();
            let mut invalidated = state.invalidate_from(PhaseKind::Edit);
            invalidated.retain(|k| *k != PhaseKind::Edit);
            state.council = Some(council);
            state.phase.mark_complete(PhaseKind::Build);
            state.touch(now());
            Some((state, invalidated))
        });

        self.commit_council(&slot, staged).await
    }

    /// Replace the council of a built session (Edit).
    ///
    /// Once the council has been executed, replacing it requires `force` and
    /// discards executions, reviews and verdict.
    pub async fn edit_council(
        &self,
        id: &SessionId,
        council: Council,
        force: bool,
    ) -> Result<CouncilOutcome, EngineError> {
        council.validate()?;
        let slot = self.slot(id).await?;
        let _guard = slot
            .try_begin(PhaseKind::Edit)
            .map_err(|in_flight| conflict(id, in_flight))?;

        let staged = slot.read(|current| {
            current.phase.check_ready(PhaseKind::Edit)?;
            if current.council.as_ref() == Some(&council) && !force {
                return Ok(None);
            }
            if current.phase.is_complete(PhaseKind::Execute) && !force {
                return Err(DomainError::Locked {
                    operation: PhaseKind::Edit,
                    phase: current.current_phase(),
                });
            }
            let mut state = current.clone();
            let invalidated = state.invalidate_downstream(PhaseKind::Edit);
            state.council = Some(council);
            state.phase.mark_complete(PhaseKind::Edit);
            state.touch(now());
            Ok(Some((state, invalidated)))
        })?;

        self.commit_council(&slot, staged).await
    }

    async fn commit_council(
        &self,
        slot: &SessionSlot,
        staged: Option<(SessionState, Vec<PhaseKind>)>,
    ) -> Result<CouncilOutcome, EngineError> {
        match staged {
            Some((state, invalidated)) => {
                self.commit(slot, state).await?;
                if !invalidated.is_empty() {
                    info!("Council replaced; invalidated {:?}", invalidated);
                }
                Ok(CouncilOutcome::Applied { invalidated })
            }
            None => Ok(CouncilOutcome::AlreadyDone),
        }
    }

    // ==================== Phase Operations ====================

    /// Start the Execute phase: every council member answers the question
    pub async fn start_execute(
        &self,
        id: &SessionId,
        force: bool,
    ) -> Result<StartOutcome, EngineError> {
        self.start_phase(id, PhaseKind::Execute, force).await
    }

    /// Start the Review phase over the successful proposals
    pub async fn start_review(&self, id: &SessionId, force: bool) -> Result<StartOutcome, EngineError> {
        self.start_phase(id, PhaseKind::Review, force).await
    }

    /// Start the chairman's synthesis
    pub async fn start_synthesize(
        &self,
        id: &SessionId,
        force: bool,
    ) -> Result<StartOutcome, EngineError> {
        self.start_phase(id, PhaseKind::Synthesize, force).await
    }

    async fn start_phase(
        &self,
        id: &SessionId,
        kind: PhaseKind,
        force: bool,
    ) -> Result<StartOutcome, EngineError> {
        let slot = self.slot(id).await?;
        let guard = slot
            .try_begin(kind)
            .map_err(|in_flight| conflict(id, in_flight))?;

        if !self.prepare(&slot, kind, force)? {
            info!("{} already done for {}; returning cached results", kind, id);
            return Ok(StartOutcome::AlreadyDone);
        }

        let engine = self.clone();
        let handle = tokio::spawn(async move { engine.run_phase(guard).await });
        Ok(StartOutcome::Accepted(PhaseTicket {
            phase: kind,
            handle,
        }))
    }

    /// Validate preconditions; `Ok(false)` means the cached artifacts stand.
    fn prepare(&self, slot: &SessionSlot, kind: PhaseKind, force: bool) -> Result<bool, DomainError> {
        slot.read(|state| {
            state.phase.check_ready(kind)?;
            if matches!(kind, PhaseKind::Review | PhaseKind::Synthesize) {
                let executions = state.executions.as_ref();
                if !executions.is_some_and(|e| e.success_count() > 0) {
                    return Err(DomainError::NoSuccessfulProposals(kind));
                }
                if kind == PhaseKind::Review
                    && executions
                        .is_some_and(|e| plan_reviews(e, self.config.exclude_own_proposal).is_empty())
                {
                    return Err(DomainError::NoReviewers);
                }
            }
            Ok(force || !state.phase.is_complete(kind))
        })
    }

    async fn run_phase(self, guard: PhaseGuard) -> Result<PhaseReport, EngineError> {
        let kind = guard.kind();
        let result = match kind {
            PhaseKind::Execute => self.run_execute(&guard).await,
            PhaseKind::Review => self.run_review(&guard).await,
            PhaseKind::Synthesize => self.run_synthesize(&guard).await,
            PhaseKind::Build | PhaseKind::Edit => Err(EngineError::Upstream {
                phase: kind,
                message: "not a spawned phase".to_string(),
            }),
        };

        let outcome = match &result {
            Ok(_) => "completed",
            Err(EngineError::Cancelled(_)) => "cancelled",
            Err(_) => "failed",
        };
        self.logger
            .log(ConversationEvent::phase_end(guard.slot().id(), kind, outcome));
        self.progress.on_phase_complete(kind);
        result
    }

    async fn run_execute(&self, guard: &PhaseGuard) -> Result<PhaseReport, EngineError> {
        let slot = guard.slot();
        let (council, context) = slot.read(|s| (s.council.clone(), s.context.clone()));
        let council = council.ok_or(DomainError::MissingPrerequisite {
            operation: PhaseKind::Execute,
            missing: "council",
        })?;

        let names: Vec<String> = council.agents.iter().map(|a| a.name.clone()).collect();
        let tracker = self.start_tracking(slot, ProgressScope::Execution, &names);
        self.announce(slot.id(), PhaseKind::Execute, names.len());

        let ledger = slot.ledger();
        let limit = self.config.context_char_limit;
        let tasks: Vec<_> = council
            .agents
            .iter()
            .cloned()
            .map(|agent| {
                let runner = self.runner.clone();
                let ledger = ledger.clone();
                let context = context.clone();
                async move { runner.run(&agent, &context, limit, &ledger).await }
            })
            .collect();

        let observer = self.observer(PhaseKind::Execute, names, &tracker);
        let outcomes = self.executor.run_batch(tasks, guard.token(), observer).await;
        self.flush(&tracker).await;

        if guard.token().is_cancelled() {
            return self.abandon(slot, PhaseKind::Execute).await;
        }

        let tasks: Vec<ExecutionTask> = council
            .agents
            .into_iter()
            .zip(outcomes)
            .enumerate()
            .map(|(i, (agent, outcome))| ExecutionTask::settled(ProposalId::new(i), agent, outcome))
            .collect();
        let succeeded = tasks.iter().filter(|t| t.is_done()).count();
        let failed = tasks.len() - succeeded;
        let statuses = tracker.snapshot();

        self.stage(slot, |state| {
            state.invalidate_from(PhaseKind::Execute);
            let generation = state.next_generation();
            state.executions = Some(ExecutionSet::new(generation, tasks));
            state.execution_status = statuses;
            if succeeded == 0 {
                state.execution_error = Some(format!("all {} agent tasks failed", failed));
            }
            state.phase.mark_complete(PhaseKind::Execute);
            state.cost = ledger.snapshot();
        })
        .await?;

        settle(PhaseKind::Execute, succeeded, failed)
    }

    async fn run_review(&self, guard: &PhaseGuard) -> Result<PhaseReport, EngineError> {
        let slot = guard.slot();
        let (question, executions) =
            slot.read(|s| (s.context.question.clone(), s.executions.clone()));
        let executions = executions.ok_or(DomainError::MissingPrerequisite {
            operation: PhaseKind::Review,
            missing: "execution results",
        })?;

        let assignments = plan_reviews(&executions, self.config.exclude_own_proposal);
        let names: Vec<String> = assignments.iter().map(|a| a.reviewer.name.clone()).collect();
        let tracker = self.start_tracking(slot, ProgressScope::Review, &names);
        self.announce(slot.id(), PhaseKind::Review, names.len());

        let live = slot.live_reviews();
        live.lock().unwrap_or_else(|e| e.into_inner()).clear();

        let ledger = slot.ledger();
        let aggregator = PeerReviewAggregator::new(self.runner.clone(), self.executor.clone());
        let observer = self.observer(PhaseKind::Review, names, &tracker);
        let reviews = aggregator
            .run(
                &question,
                &executions,
                &assignments,
                ledger.clone(),
                guard.token(),
                observer,
                live.clone(),
            )
            .await;
        self.flush(&tracker).await;

        if guard.token().is_cancelled() {
            return self.abandon(slot, PhaseKind::Review).await;
        }

        let succeeded = reviews.iter().filter(|r| r.is_done()).count();
        let failed = reviews.len() - succeeded;
        let statuses = tracker.snapshot();

        self.stage(slot, |state| {
            state.invalidate_from(PhaseKind::Review);
            state.reviews = Some(ReviewSet::new(executions.generation, reviews));
            state.review_status = statuses;
            if succeeded == 0 {
                state.review_error = Some(format!("all {} review tasks failed", failed));
            }
            state.phase.mark_complete(PhaseKind::Review);
            state.cost = ledger.snapshot();
        })
        .await?;

        settle(PhaseKind::Review, succeeded, failed)
    }

    async fn run_synthesize(&self, guard: &PhaseGuard) -> Result<PhaseReport, EngineError> {
        let slot = guard.slot();
        let (question, executions, reviews) = slot.read(|s| {
            (
                s.context.question.clone(),
                s.executions.clone(),
                s.reviews.clone(),
            )
        });
        let (Some(executions), Some(reviews)) = (executions, reviews) else {
            return Err(DomainError::MissingPrerequisite {
                operation: PhaseKind::Synthesize,
                missing: "peer reviews",
            }
            .into());
        };

        let chairman_name = self.config.chairman.name.clone();
        self.announce(slot.id(), PhaseKind::Synthesize, 1);
        self.progress.on_task_start(PhaseKind::Synthesize, &chairman_name);

        let ledger = slot.ledger();
        let chairman = ChairmanSynthesizer::new(
            self.runner.clone(),
            self.executor.clone(),
            self.config.chairman.clone(),
        );
        let outcome = chairman
            .synthesize(&question, &executions, &reviews, ledger.clone(), guard.token())
            .await;

        if guard.token().is_cancelled() {
            return self.abandon(slot, PhaseKind::Synthesize).await;
        }
        self.progress
            .on_task_complete(PhaseKind::Synthesize, &chairman_name, outcome.is_success());

        match outcome {
            TaskOutcome::Success(verdict) => {
                self.stage(slot, |state| {
                    state.invalidate_from(PhaseKind::Synthesize);
                    state.verdict = Some(verdict);
                    state.phase.mark_complete(PhaseKind::Synthesize);
                    state.phase.finalize();
                    state.cost = ledger.snapshot();
                })
                .await?;
                settle(PhaseKind::Synthesize, 1, 0)
            }
            TaskOutcome::Failure(failure) => {
                warn!("Chairman failed: {}", failure);
                self.stage(slot, |state| {
                    state.synthesis_error = Some(failure.to_string());
                    state.cost = ledger.snapshot();
                })
                .await?;
                Err(EngineError::Upstream {
                    phase: PhaseKind::Synthesize,
                    message: failure.to_string(),
                })
            }
        }
    }

    // ==================== Queries ====================

    /// Current phase plus live per-task statuses
    pub async fn get_status(&self, id: &SessionId) -> Result<StatusReport, EngineError> {
        let slot = self.slot(id).await?;
        let mut report = slot.read(|state| StatusReport {
            session_id: state.id.clone(),
            phase: state.current_phase(),
            in_flight: None,
            execution_status: state.execution_status.clone(),
            review_status: state.review_status.clone(),
            cost: state.cost,
            errors: [
                &state.execution_error,
                &state.review_error,
                &state.synthesis_error,
            ]
            .into_iter()
            .flatten()
            .cloned()
            .collect(),
        });

        report.in_flight = slot.in_flight();
        report.cost = slot.ledger().snapshot();
        if let Some(tracker) = slot.tracker() {
            match tracker.scope() {
                ProgressScope::Execution => report.execution_status = tracker.snapshot(),
                ProgressScope::Review => report.review_status = tracker.snapshot(),
            }
        }
        Ok(report)
    }

    /// Tasks of the current execution set, ordered by proposal id
    pub async fn get_results(&self, id: &SessionId) -> Result<Vec<ExecutionTask>, EngineError> {
        let slot = self.slot(id).await?;
        Ok(slot.read(|state| {
            state
                .executions
                .as_ref()
                .map(|e| e.tasks.clone())
                .unwrap_or_default()
        }))
    }

    /// Reviews of the current execution set and their aggregated scores.
    ///
    /// While a Review phase runs this returns the reviews settled so far.
    pub async fn get_reviews(&self, id: &SessionId) -> Result<ReviewsReport, EngineError> {
        let slot = self.slot(id).await?;

        if slot.in_flight() == Some(PhaseKind::Review) {
            let reviews = slot
                .live_reviews()
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            return Ok(ReviewsReport {
                scores: PeerReviewAggregator::aggregate(&reviews),
                reviews,
                partial: true,
            });
        }

        Ok(slot.read(|state| {
            let current = state.executions.as_ref().map(|e| e.generation);
            let reviews = state
                .reviews
                .as_ref()
                .filter(|r| Some(r.execution_generation) == current)
                .map(|r| r.reviews.clone())
                .unwrap_or_default();
            ReviewsReport {
                scores: state.aggregated_scores(),
                reviews,
                partial: false,
            }
        }))
    }

    /// The chairman's verdict, if synthesized from the current execution set
    pub async fn get_verdict(&self, id: &SessionId) -> Result<Option<String>, EngineError> {
        let slot = self.slot(id).await?;
        Ok(slot.read(|state| {
            let current = state.executions.as_ref().map(|e| e.generation);
            state
                .verdict
                .as_ref()
                .filter(|v| Some(v.execution_generation) == current)
                .map(|v| v.text.clone())
        }))
    }

    /// Full state of a session
    pub async fn session_state(&self, id: &SessionId) -> Result<SessionState, EngineError> {
        Ok(self.slot(id).await?.snapshot())
    }

    // ==================== Internals ====================

    async fn slot(&self, id: &SessionId) -> Result<Arc<SessionSlot>, EngineError> {
        if let Some(slot) = self.store.get(id) {
            return Ok(slot);
        }

        let state = match self.persistence.load(id).await {
            Ok(state) => state,
            Err(PersistenceError::NotFound(_)) => {
                return Err(EngineError::SessionNotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        if state.schema_version != SCHEMA_VERSION {
            return Err(PersistenceError::SchemaMismatch {
                found: state.schema_version,
                expected: SCHEMA_VERSION,
            }
            .into());
        }
        Ok(self.store.insert(SessionSlot::new(state, self.pricing)))
    }

    fn start_tracking(
        &self,
        slot: &SessionSlot,
        scope: ProgressScope,
        names: &[String],
    ) -> ProgressTracker {
        let tracker = ProgressTracker::new(
            slot.id().clone(),
            scope,
            self.persistence.clone(),
            self.config.progress_debounce,
        );
        for name in names {
            tracker.report(name, TaskStatus::Pending);
        }
        slot.set_tracker(Some(tracker.clone()));
        tracker
    }

    fn observer(
        &self,
        phase: PhaseKind,
        names: Vec<String>,
        tracker: &ProgressTracker,
    ) -> Arc<dyn BatchObserver> {
        Arc::new(PhaseObserver {
            phase,
            names,
            tracker: tracker.clone(),
            notifier: self.progress.clone(),
        })
    }

    fn announce(&self, id: &SessionId, phase: PhaseKind, tasks: usize) {
        info!("Phase: {} ({} tasks)", phase.display_name(), tasks);
        self.logger
            .log(ConversationEvent::phase_start(id, phase, tasks));
        self.progress.on_phase_start(phase, tasks);
    }

    async fn flush(&self, tracker: &ProgressTracker) {
        if let Err(e) = tracker.flush().await {
            warn!("Failed to persist progress: {}", e);
        }
    }

    /// Persist the cost of a cancelled phase without committing its artifacts
    async fn abandon(
        &self,
        slot: &SessionSlot,
        phase: PhaseKind,
    ) -> Result<PhaseReport, EngineError> {
        warn!("{} cancelled for session {}", phase.display_name(), slot.id());
        let ledger = slot.ledger();
        self.stage(slot, |state| state.cost = ledger.snapshot()).await?;
        Err(EngineError::Cancelled(phase))
    }

    /// Apply `change` to a copy of the session state and commit the copy
    async fn stage(
        &self,
        slot: &SessionSlot,
        change: impl FnOnce(&mut SessionState),
    ) -> Result<(), EngineError> {
        let mut state = slot.snapshot();
        change(&mut state);
        state.touch(now());
        self.commit(slot, state).await
    }

    /// Persist `state`, then swap it into the slot.
    ///
    /// On a failed save the slot keeps its previous state, so memory never
    /// runs ahead of storage.
    async fn commit(&self, slot: &SessionSlot, state: SessionState) -> Result<(), EngineError> {
        let id = state.id.clone();
        self.persistence
            .save(&id, SessionUpdate::replace(state.clone()))
            .await
            .map_err(|e| {
                warn!("Failed to persist session {}: {}", id, e);
                EngineError::Persistence(e)
            })?;
        slot.replace(state);
        Ok(())
    }
}

/// Feeds executor events into the tracker and the progress notifier
struct PhaseObserver {
    phase: PhaseKind,
    names: Vec<String>,
    tracker: ProgressTracker,
    notifier: Arc<dyn ProgressNotifier>,
}

impl BatchObserver for PhaseObserver {
    fn on_task_start(&self, index: usize) {
        if let Some(name) = self.names.get(index) {
            self.tracker.report(name, TaskStatus::Running);
            self.notifier.on_task_start(self.phase, name);
        }
    }

    fn on_task_settled(&self, index: usize, success: bool) {
        if let Some(name) = self.names.get(index) {
            let status = if success {
                TaskStatus::Done
            } else {
                TaskStatus::Failed
            };
            self.tracker.report(name, status);
            self.notifier.on_task_complete(self.phase, name, success);
        }
    }
}

fn settle(phase: PhaseKind, succeeded: usize, failed: usize) -> Result<PhaseReport, EngineError> {
    if succeeded == 0 && failed > 0 {
        return Err(EngineError::Upstream {
            phase,
            message: format!("all {} tasks failed", failed),
        });
    }
    info!("{} settled: {} done, {} failed", phase.display_name(), succeeded, failed);
    Ok(PhaseReport {
        phase,
        succeeded,
        failed,
    })
}

fn conflict(id: &SessionId, in_flight: Claim) -> EngineError {
    EngineError::ConcurrencyConflict {
        session: id.clone(),
        in_flight,
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `session_YYYYMMDD_HHMMSS_xxxxxx`
fn generate_session_id() -> SessionId {
    let suffix = Uuid::new_v4().simple().to_string();
    SessionId::new(format!(
        "session_{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        &suffix[..6]
    ))
}
