//! Session phase machine
//!
//! [`PhaseRecord`] tracks which phases of a session have produced artifacts
//! and which phase the session is in. It is pure state: the exclusivity of
//! in-flight phases is enforced by the engine, which owns the record.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// An operation that advances the session pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Build,
    Edit,
    Execute,
    Review,
    Synthesize,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 5] = [
        PhaseKind::Build,
        PhaseKind::Edit,
        PhaseKind::Execute,
        PhaseKind::Review,
        PhaseKind::Synthesize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Build => "build",
            PhaseKind::Edit => "edit",
            PhaseKind::Execute => "execute",
            PhaseKind::Review => "review",
            PhaseKind::Synthesize => "synthesize",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PhaseKind::Build => "Council Build",
            PhaseKind::Edit => "Council Edit",
            PhaseKind::Execute => "Parallel Execution",
            PhaseKind::Review => "Peer Review",
            PhaseKind::Synthesize => "Chairman Synthesis",
        }
    }

    /// Phase the session enters when this operation completes
    pub fn completed_phase(&self) -> CouncilPhase {
        match self {
            PhaseKind::Build => CouncilPhase::Built,
            PhaseKind::Edit => CouncilPhase::Edited,
            PhaseKind::Execute => CouncilPhase::Executed,
            PhaseKind::Review => CouncilPhase::Reviewed,
            PhaseKind::Synthesize => CouncilPhase::Synthesized,
        }
    }

    /// Operations whose artifacts are derived from this one's.
    ///
    /// Build and Edit both produce the council, so either one invalidates
    /// everything from Execute onwards.
    pub fn downstream(&self) -> &'static [PhaseKind] {
        match self {
            PhaseKind::Build | PhaseKind::Edit => &[
                PhaseKind::Execute,
                PhaseKind::Review,
                PhaseKind::Synthesize,
            ],
            PhaseKind::Execute => &[PhaseKind::Review, PhaseKind::Synthesize],
            PhaseKind::Review => &[PhaseKind::Synthesize],
            PhaseKind::Synthesize => &[],
        }
    }

    /// Compact code used by lock-free in-flight markers (0 means idle)
    pub fn code(&self) -> u8 {
        match self {
            PhaseKind::Build => 1,
            PhaseKind::Edit => 2,
            PhaseKind::Execute => 3,
            PhaseKind::Review => 4,
            PhaseKind::Synthesize => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        PhaseKind::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a session is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouncilPhase {
    #[default]
    Input,
    Built,
    Edited,
    Executed,
    Reviewed,
    Synthesized,
    /// Terminal: reached once the verdict is recorded
    Complete,
}

impl CouncilPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouncilPhase::Input => "input",
            CouncilPhase::Built => "built",
            CouncilPhase::Edited => "edited",
            CouncilPhase::Executed => "executed",
            CouncilPhase::Reviewed => "reviewed",
            CouncilPhase::Synthesized => "synthesized",
            CouncilPhase::Complete => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CouncilPhase::Complete)
    }
}

impl std::fmt::Display for CouncilPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-phase completion flags plus the current phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    current: CouncilPhase,
    built: bool,
    edited: bool,
    executed: bool,
    reviewed: bool,
    synthesized: bool,
}

impl PhaseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> CouncilPhase {
        self.current
    }

    pub fn is_complete(&self, kind: PhaseKind) -> bool {
        match kind {
            PhaseKind::Build => self.built,
            PhaseKind::Edit => self.edited,
            PhaseKind::Execute => self.executed,
            PhaseKind::Review => self.reviewed,
            PhaseKind::Synthesize => self.synthesized,
        }
    }

    fn flag_mut(&mut self, kind: PhaseKind) -> &mut bool {
        match kind {
            PhaseKind::Build => &mut self.built,
            PhaseKind::Edit => &mut self.edited,
            PhaseKind::Execute => &mut self.executed,
            PhaseKind::Review => &mut self.reviewed,
            PhaseKind::Synthesize => &mut self.synthesized,
        }
    }

    /// Check that the prerequisites of `kind` are in place.
    ///
    /// This only looks at upstream phases; whether `kind` itself already ran
    /// (idempotency) is decided by the caller.
    pub fn check_ready(&self, kind: PhaseKind) -> Result<(), DomainError> {
        let missing = match kind {
            PhaseKind::Build => None,
            PhaseKind::Edit | PhaseKind::Execute if !self.built => Some("council"),
            PhaseKind::Review if !self.executed => Some("execution results"),
            PhaseKind::Synthesize if !self.reviewed => Some("peer reviews"),
            _ => None,
        };
        match missing {
            Some(missing) => Err(DomainError::MissingPrerequisite {
                operation: kind,
                missing,
            }),
            None => Ok(()),
        }
    }

    /// Record that `kind` produced its artifacts.
    pub fn mark_complete(&mut self, kind: PhaseKind) {
        *self.flag_mut(kind) = true;
        self.current = kind.completed_phase();
    }

    /// Enter the terminal phase once synthesis is recorded.
    pub fn finalize(&mut self) {
        if self.synthesized {
            self.current = CouncilPhase::Complete;
        }
    }

    /// Clear `kind` and everything derived from it.
    ///
    /// Returns the operations that were actually cleared.
    pub fn invalidate_from(&mut self, kind: PhaseKind) -> Vec<PhaseKind> {
        let mut cleared = Vec::new();
        for k in std::iter::once(kind).chain(kind.downstream().iter().copied()) {
            let flag = self.flag_mut(k);
            if *flag {
                *flag = false;
                cleared.push(k);
            }
        }
        self.current = self.latest_phase();
        cleared
    }

    /// Clear only what is derived from `kind`, keeping `kind` itself.
    pub fn invalidate_downstream(&mut self, kind: PhaseKind) -> Vec<PhaseKind> {
        let mut cleared = Vec::new();
        for &k in kind.downstream() {
            let flag = self.flag_mut(k);
            if *flag {
                *flag = false;
                cleared.push(k);
            }
        }
        self.current = self.latest_phase();
        cleared
    }

    fn latest_phase(&self) -> CouncilPhase {
        if self.synthesized {
            CouncilPhase::Complete
        } else if self.reviewed {
            CouncilPhase::Reviewed
        } else if self.executed {
            CouncilPhase::Executed
        } else if self.edited {
            CouncilPhase::Edited
        } else if self.built {
            CouncilPhase::Built
        } else {
            CouncilPhase::Input
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn through(kinds: &[PhaseKind]) -> PhaseRecord {
        let mut record = PhaseRecord::new();
        for &k in kinds {
            record.check_ready(k).unwrap();
            record.mark_complete(k);
        }
        record
    }

    #[test]
    fn test_forward_transitions() {
        let mut record = through(&[PhaseKind::Build]);
        assert_eq!(record.current(), CouncilPhase::Built);

        record.mark_complete(PhaseKind::Execute);
        assert_eq!(record.current(), CouncilPhase::Executed);

        record.mark_complete(PhaseKind::Review);
        record.mark_complete(PhaseKind::Synthesize);
        assert_eq!(record.current(), CouncilPhase::Synthesized);

        record.finalize();
        assert_eq!(record.current(), CouncilPhase::Complete);
        assert!(record.current().is_terminal());
    }

    #[test]
    fn test_edit_is_optional_before_execute() {
        let record = through(&[PhaseKind::Build, PhaseKind::Execute]);
        assert!(!record.is_complete(PhaseKind::Edit));
        assert!(record.is_complete(PhaseKind::Execute));
    }

    #[test]
    fn test_missing_prerequisites() {
        let record = PhaseRecord::new();
        assert!(matches!(
            record.check_ready(PhaseKind::Execute),
            Err(DomainError::MissingPrerequisite { missing: "council", .. })
        ));

        let record = through(&[PhaseKind::Build]);
        assert!(matches!(
            record.check_ready(PhaseKind::Review),
            Err(DomainError::MissingPrerequisite { missing: "execution results", .. })
        ));

        let record = through(&[PhaseKind::Build, PhaseKind::Execute]);
        assert!(matches!(
            record.check_ready(PhaseKind::Synthesize),
            Err(DomainError::MissingPrerequisite { missing: "peer reviews", .. })
        ));
    }

    #[test]
    fn test_invalidate_execute_cascades() {
        let mut record = through(&[
            PhaseKind::Build,
            PhaseKind::Execute,
            PhaseKind::Review,
            PhaseKind::Synthesize,
        ]);
        record.finalize();

        let cleared = record.invalidate_from(PhaseKind::Execute);
        assert_eq!(
            cleared,
            vec![PhaseKind::Execute, PhaseKind::Review, PhaseKind::Synthesize]
        );
        assert_eq!(record.current(), CouncilPhase::Built);
        assert!(record.is_complete(PhaseKind::Build));
    }

    #[test]
    fn test_invalidate_downstream_keeps_phase() {
        let mut record = through(&[PhaseKind::Build, PhaseKind::Execute, PhaseKind::Review]);
        let cleared = record.invalidate_downstream(PhaseKind::Execute);
        assert_eq!(cleared, vec![PhaseKind::Review]);
        assert_eq!(record.current(), CouncilPhase::Executed);
    }

    #[test]
    fn test_phase_codes_round_trip() {
        for kind in PhaseKind::ALL {
            assert_eq!(PhaseKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(PhaseKind::from_code(0), None);
    }
}
