//! Execution task entities

use super::value_objects::{ProposalId, TaskFailure, TaskOutcome, TaskResult};
use crate::council::AgentSpec;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One agent's proposal (Entity)
///
/// Immutable once settled. Only ever replaced wholesale, together with its
/// siblings, by a forced re-execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTask {
    pub proposal_id: ProposalId,
    pub agent: AgentSpec,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
}

impl ExecutionTask {
    /// Build a settled task from its outcome
    pub fn settled(proposal_id: ProposalId, agent: AgentSpec, outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Success(result) => Self {
                proposal_id,
                agent,
                status: TaskStatus::Done,
                result: Some(result),
                error: None,
            },
            TaskOutcome::Failure(error) => Self {
                proposal_id,
                agent,
                status: TaskStatus::Failed,
                result: None,
                error: Some(error),
            },
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn agent_name(&self) -> &str {
        &self.agent.name
    }

    /// Response text of a successful task
    pub fn response(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.response.as_str())
    }
}

/// The full result set of one Execute phase.
///
/// `generation` increases with every forced re-execute so that downstream
/// artifacts can tell which set they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSet {
    pub generation: u64,
    pub tasks: Vec<ExecutionTask>,
}

impl ExecutionSet {
    /// Create a set from settled tasks, ordering them by proposal id.
    pub fn new(generation: u64, mut tasks: Vec<ExecutionTask>) -> Self {
        tasks.sort_by_key(|t| t.proposal_id);
        Self { generation, tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: ProposalId) -> Option<&ExecutionTask> {
        self.tasks.iter().find(|t| t.proposal_id == id)
    }

    pub fn successful(&self) -> impl Iterator<Item = &ExecutionTask> {
        self.tasks.iter().filter(|t| t.is_done())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExecutionTask> {
        self.tasks.iter().filter(|t| t.status == TaskStatus::Failed)
    }

    pub fn success_count(&self) -> usize {
        self.successful().count()
    }

    pub fn contains(&self, id: ProposalId) -> bool {
        self.get(id).is_some()
    }
}
