//! Domain error types

use crate::orchestration::phase::{CouncilPhase, PhaseKind};
use thiserror::Error;

/// Domain-level errors
///
/// These are the validation failures of the council pipeline: a request
/// that can never succeed in the current state of the session. They are
/// returned synchronously and prevent a batch from starting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Council has no agents")]
    NoAgents,

    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Duplicate agent name: {0}")]
    DuplicateAgent(String),

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Cannot {operation}: {missing} not available")]
    MissingPrerequisite {
        operation: PhaseKind,
        missing: &'static str,
    },

    #[error("Cannot {0}: no successful proposals in the current execution set")]
    NoSuccessfulProposals(PhaseKind),

    #[error("Cannot {operation} while the session is {phase} without force")]
    Locked {
        operation: PhaseKind,
        phase: CouncilPhase,
    },

    #[error("Cannot review: no reviewer has a proposal to critique")]
    NoReviewers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_display() {
        let error = DomainError::Locked {
            operation: PhaseKind::Edit,
            phase: CouncilPhase::Executed,
        };
        assert_eq!(
            error.to_string(),
            "Cannot edit while the session is executed without force"
        );
    }

    #[test]
    fn test_missing_prerequisite_display() {
        let error = DomainError::MissingPrerequisite {
            operation: PhaseKind::Synthesize,
            missing: "peer reviews",
        };
        assert_eq!(
            error.to_string(),
            "Cannot synthesize: peer reviews not available"
        );
    }
}
