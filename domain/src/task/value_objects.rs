//! Task value objects - immutable results of a single agent invocation.
//!
//! # Identifiers
//! - [`ProposalId`] - zero-based ordinal of a proposal within one execution set
//!
//! # Outcomes
//! - [`TaskResult`] - response, summary, tools and token usage of a settled task
//! - [`TaskFailure`] - why a task failed, recorded as data rather than raised
//! - [`TaskOutcome`] - tagged success/failure for any kind of task payload

use serde::{Deserialize, Serialize};

/// Zero-based ordinal of a proposal, matching council order at Execute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(usize);

impl ProposalId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ProposalId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Token usage reported for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Result of a successful agent task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Full response text
    pub response: String,
    /// Short summary (TLDR) of the response
    pub summary: String,
    /// Names of the tools the agent invoked, in invocation order
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Category of a task failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Input rejected before invocation (empty persona or context)
    InvalidInput,
    /// Task did not settle within the configured duration
    Timeout,
    RateLimited,
    /// Upstream failure that may succeed on a later attempt
    Transient,
    /// Upstream failure that will not succeed on retry
    Permanent,
    /// The invocation returned output that could not be interpreted
    MalformedOutput,
    Cancelled,
    /// The task panicked; the batch carried on without it
    Aborted,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure of a single task, surfaced as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("task did not settle within {}s", after.as_secs_f64()),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "task cancelled")
    }
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Terminal outcome of a task.
///
/// Generic over the success payload so proposal tasks and review tasks share
/// the same failure contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome<T = TaskResult> {
    Success(T),
    Failure(TaskFailure),
}

impl<T> TaskOutcome<T> {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        TaskOutcome::Failure(TaskFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn as_failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskOutcome::Failure(f) => Some(f),
            TaskOutcome::Success(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, TaskFailure> {
        match self {
            TaskOutcome::Success(v) => Ok(v),
            TaskOutcome::Failure(f) => Err(f),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TaskOutcome<U> {
        match self {
            TaskOutcome::Success(v) => TaskOutcome::Success(f(v)),
            TaskOutcome::Failure(e) => TaskOutcome::Failure(e),
        }
    }
}

impl<T> From<Result<T, TaskFailure>> for TaskOutcome<T> {
    fn from(result: Result<T, TaskFailure>) -> Self {
        match result {
            Ok(v) => TaskOutcome::Success(v),
            Err(e) => TaskOutcome::Failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total() {
        assert_eq!(TokenUsage::new(120, 30).total(), 150);
    }

    #[test]
    fn test_outcome_map_preserves_failure() {
        let outcome: TaskOutcome<u32> = TaskOutcome::failure(FailureKind::RateLimited, "429");
        let mapped = outcome.map(|v| v + 1);
        assert_eq!(mapped.as_failure().unwrap().kind, FailureKind::RateLimited);
    }

    #[test]
    fn test_failure_display() {
        let failure = TaskFailure::new(FailureKind::Transient, "connection reset");
        assert_eq!(failure.to_string(), "transient: connection reset");
    }

    #[test]
    fn test_proposal_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ProposalId::new(2)).unwrap(), "2");
    }
}
