//! Session entities

use crate::context::SharedContext;
use crate::core::string::truncate;
use crate::cost::CostTotals;
use crate::council::Council;
use crate::orchestration::phase::{CouncilPhase, PhaseKind, PhaseRecord};
use crate::orchestration::value_objects::Verdict;
use crate::review::{AggregatedScore, ReviewSet, aggregate};
use crate::task::{ExecutionSet, ProposalId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the persisted [`SessionState`] layout
pub const SCHEMA_VERSION: u32 = 1;

/// Identifier of a council session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Complete state of one session (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub schema_version: u32,
    /// Incremented on every full-state write
    pub revision: u64,
    pub id: SessionId,
    /// RFC3339 timestamps
    pub created_at: String,
    pub updated_at: String,
    pub context: SharedContext,
    pub phase: PhaseRecord,
    #[serde(default)]
    pub council: Option<Council>,
    #[serde(default)]
    pub executions: Option<ExecutionSet>,
    #[serde(default)]
    pub reviews: Option<ReviewSet>,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    /// Live task status of the Execute phase, keyed by agent name
    #[serde(default)]
    pub execution_status: BTreeMap<String, TaskStatus>,
    /// Live task status of the Review phase, keyed by reviewer name
    #[serde(default)]
    pub review_status: BTreeMap<String, TaskStatus>,
    #[serde(default)]
    pub cost: CostTotals,
    /// Last execution generation handed out; never reused
    #[serde(default)]
    pub last_generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
}

impl SessionState {
    pub fn new(id: SessionId, context: SharedContext, created_at: impl Into<String>) -> Self {
        let created_at = created_at.into();
        Self {
            schema_version: SCHEMA_VERSION,
            revision: 0,
            id,
            updated_at: created_at.clone(),
            created_at,
            context,
            phase: PhaseRecord::new(),
            council: None,
            executions: None,
            reviews: None,
            verdict: None,
            execution_status: BTreeMap::new(),
            review_status: BTreeMap::new(),
            cost: CostTotals::default(),
            last_generation: 0,
            execution_error: None,
            review_error: None,
            synthesis_error: None,
        }
    }

    pub fn current_phase(&self) -> CouncilPhase {
        self.phase.current()
    }

    /// Allocate the generation number of the next execution set
    pub fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    /// Record a full-state change: bump the revision and the update time.
    pub fn touch(&mut self, now: impl Into<String>) {
        self.revision += 1;
        self.updated_at = now.into();
    }

    /// Discard the artifacts of `kind` and of every phase derived from it.
    pub fn invalidate_from(&mut self, kind: PhaseKind) -> Vec<PhaseKind> {
        for k in std::iter::once(kind).chain(kind.downstream().iter().copied()) {
            self.clear_artifacts(k);
        }
        self.phase.invalidate_from(kind)
    }

    /// Discard only the artifacts derived from `kind`.
    pub fn invalidate_downstream(&mut self, kind: PhaseKind) -> Vec<PhaseKind> {
        for &k in kind.downstream() {
            self.clear_artifacts(k);
        }
        self.phase.invalidate_downstream(kind)
    }

    fn clear_artifacts(&mut self, kind: PhaseKind) {
        match kind {
            PhaseKind::Build | PhaseKind::Edit => {}
            PhaseKind::Execute => {
                self.executions = None;
                self.execution_status.clear();
                self.execution_error = None;
            }
            PhaseKind::Review => {
                self.reviews = None;
                self.review_status.clear();
                self.review_error = None;
            }
            PhaseKind::Synthesize => {
                self.verdict = None;
                self.synthesis_error = None;
            }
        }
    }

    /// Aggregated scores of the current review set.
    ///
    /// Derived on every call; reviews of a stale execution generation are
    /// never aggregated.
    pub fn aggregated_scores(&self) -> BTreeMap<ProposalId, AggregatedScore> {
        match (&self.reviews, &self.executions) {
            (Some(reviews), Some(executions))
                if reviews.execution_generation == executions.generation =>
            {
                aggregate(&reviews.reviews)
            }
            _ => BTreeMap::new(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            phase: self.current_phase(),
            question: truncate(self.context.question.content(), 100),
            total_cost_usd: self.cost.total_cost_usd,
            total_tokens: self.cost.total_tokens,
        }
    }
}

/// Listing entry for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub created_at: String,
    pub updated_at: String,
    pub phase: CouncilPhase,
    pub question: String,
    pub total_cost_usd: f64,
    pub total_tokens: u64,
}
