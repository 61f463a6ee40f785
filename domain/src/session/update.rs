//! Partial session updates

use super::entities::SessionState;
use crate::task::TaskStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which live status submap a progress update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressScope {
    Execution,
    Review,
}

impl ProgressScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressScope::Execution => "execution",
            ProgressScope::Review => "review",
        }
    }
}

/// A write to persisted session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// Merge task statuses key-by-key into one status submap
    Progress {
        scope: ProgressScope,
        statuses: BTreeMap<String, TaskStatus>,
    },
    /// Replace the whole state, unless the stored revision is newer
    Replace(Box<SessionState>),
}

impl SessionUpdate {
    pub fn progress(scope: ProgressScope, statuses: BTreeMap<String, TaskStatus>) -> Self {
        SessionUpdate::Progress { scope, statuses }
    }

    pub fn replace(state: SessionState) -> Self {
        SessionUpdate::Replace(Box::new(state))
    }

    /// Apply this update to stored state.
    ///
    /// Returns `false` when the update was discarded because it is older than
    /// what is stored.
    pub fn apply_to(self, stored: &mut SessionState) -> bool {
        match self {
            SessionUpdate::Progress { scope, statuses } => {
                let target = match scope {
                    ProgressScope::Execution => &mut stored.execution_status,
                    ProgressScope::Review => &mut stored.review_status,
                };
                target.extend(statuses);
                true
            }
            SessionUpdate::Replace(state) => {
                if state.revision < stored.revision {
                    return false;
                }
                *stored = *state;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SharedContext;
    use crate::core::question::Question;
    use crate::session::entities::SessionId;

    fn state(revision: u64) -> SessionState {
        let mut state = SessionState::new(
            SessionId::new("s"),
            SharedContext::new(Question::try_new("Q?").unwrap()),
            "t0",
        );
        state.revision = revision;
        state
    }

    #[test]
    fn test_progress_merges_keys() {
        let mut stored = state(1);
        stored.execution_status.insert("A".into(), TaskStatus::Running);
        stored.execution_status.insert("B".into(), TaskStatus::Running);

        let applied = SessionUpdate::progress(
            ProgressScope::Execution,
            BTreeMap::from([("A".to_string(), TaskStatus::Done)]),
        )
        .apply_to(&mut stored);

        assert!(applied);
        assert_eq!(stored.execution_status["A"], TaskStatus::Done);
        assert_eq!(stored.execution_status["B"], TaskStatus::Running);
        assert!(stored.review_status.is_empty());
    }

    #[test]
    fn test_stale_replace_is_discarded() {
        let mut stored = state(5);
        let mut old = state(4);
        old.updated_at = "old".into();
        assert!(!SessionUpdate::replace(old).apply_to(&mut stored));
        assert_eq!(stored.updated_at, "t0");

        let newer = state(6);
        assert!(SessionUpdate::replace(newer).apply_to(&mut stored));
        assert_eq!(stored.revision, 6);
    }
}
