//! Agent invoker port
//!
//! Defines the interface for running one agent against an LLM backend.
//! Concrete invokers (HTTP, dry-run, test mocks) live in the infrastructure
//! layer and are selected by configuration.

use async_trait::async_trait;
use council_domain::{FailureKind, ProposalId, ReasoningEffort, TokenUsage};
use thiserror::Error;

/// Errors that can occur while invoking an agent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokerError {
    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Timeout")]
    Timeout,

    #[error("Permanent error: {0}")]
    Permanent(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),
}

impl InvokerError {
    /// How a task that hit this error is recorded
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            InvokerError::Transient(_) => FailureKind::Transient,
            InvokerError::RateLimited(_) => FailureKind::RateLimited,
            InvokerError::Timeout => FailureKind::Timeout,
            InvokerError::Permanent(_) => FailureKind::Permanent,
            InvokerError::MalformedOutput(_) => FailureKind::MalformedOutput,
        }
    }

    /// Whether a retry by a wrapping layer could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InvokerError::Transient(_) | InvokerError::RateLimited(_) | InvokerError::Timeout
        )
    }
}

/// What an invocation is for. Invokers may use it to shape their output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationPurpose {
    /// Answer the question (Execute phase)
    Proposal,
    /// Critique the listed proposals (Review phase)
    Review { proposal_ids: Vec<ProposalId> },
    /// Merge proposals and critiques into a verdict
    Synthesis,
}

impl InvocationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationPurpose::Proposal => "proposal",
            InvocationPurpose::Review { .. } => "review",
            InvocationPurpose::Synthesis => "synthesis",
        }
    }
}

/// One request to an agent
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub agent_name: String,
    /// System-level instructions (persona and task framing)
    pub instructions: String,
    pub reasoning_effort: ReasoningEffort,
    pub tools_enabled: bool,
    pub prompt: String,
    pub purpose: InvocationPurpose,
}

/// A completed invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub response: String,
    /// Names of the tools the agent invoked
    pub tools_used: Vec<String>,
    pub usage: TokenUsage,
}

/// Capability to run one agent
///
/// The engine treats every error as a per-task failure and never retries.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Model name used for pricing and transcripts
    fn model(&self) -> &str;

    /// Run the agent and return its response
    async fn invoke(&self, invocation: &AgentInvocation) -> Result<Invocation, InvokerError>;
}
