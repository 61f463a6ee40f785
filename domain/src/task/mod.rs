//! Task domain - proposals produced during the Execute phase.
//!
//! - [`value_objects`] - identifiers, token usage and task outcomes
//! - [`entities`] - [`ExecutionTask`] and the [`ExecutionSet`] that owns them

pub mod entities;
pub mod value_objects;

pub use entities::{ExecutionSet, ExecutionTask, TaskStatus};
pub use value_objects::{FailureKind, ProposalId, TaskFailure, TaskOutcome, TaskResult, TokenUsage};
