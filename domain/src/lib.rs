//! Domain layer for agent-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council is an ordered list of agents, each with its own persona. A
//! session takes one question through three paid phases:
//!
//! - **Execute**: every agent answers the question independently (a *proposal*)
//! - **Review**: every agent critiques the proposals with a 1-5 score
//! - **Synthesize**: a chairman merges proposals and critiques into a verdict
//!
//! ## Phase machine
//!
//! [`PhaseRecord`] tracks which phases produced artifacts. Forcing a phase to
//! re-run discards its artifacts and everything derived from them.

pub mod config;
pub mod context;
pub mod core;
pub mod cost;
pub mod council;
pub mod orchestration;
pub mod prompt;
pub mod review;
pub mod session;
pub mod task;

// Re-export commonly used types
pub use config::OutputFormat;
pub use context::{ContextDocument, DEFAULT_DOCUMENT_CHAR_LIMIT, SharedContext};
pub use core::{error::DomainError, question::Question};
pub use cost::{CostTotals, ModelPricing};
pub use council::{AgentSpec, Council, ReasoningEffort};
pub use orchestration::{
    phase::{CouncilPhase, PhaseKind, PhaseRecord},
    value_objects::Verdict,
};
pub use prompt::{PROPOSAL_CHAR_LIMIT, PromptTemplate};
pub use review::{
    AggregatedScore, Critique, ParsedReview, ReviewParseError, ReviewSet, ReviewTask, Score,
    aggregate, extract_summary, parse_review_output,
};
pub use session::{
    ProgressScope, SCHEMA_VERSION, SessionId, SessionState, SessionSummary, SessionUpdate,
};
pub use task::{
    ExecutionSet, ExecutionTask, FailureKind, ProposalId, TaskFailure, TaskOutcome, TaskResult,
    TaskStatus, TokenUsage,
};
