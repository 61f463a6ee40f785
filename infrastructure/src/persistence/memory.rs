//! In-memory session storage

use async_trait::async_trait;
use council_application::ports::persistence::{PersistenceError, PersistenceGateway};
use council_domain::{SessionId, SessionState, SessionSummary, SessionUpdate};
use std::collections::HashMap;
use std::sync::Mutex;

/// Session states kept in a process-local map.
///
/// Every update is applied under one lock, which makes progress merges and
/// full replacements atomic with respect to each other.
#[derive(Default)]
pub struct InMemoryPersistence {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryPersistence {
    async fn load(&self, id: &SessionId) -> Result<SessionState, PersistenceError> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))
    }

    async fn save(&self, id: &SessionId, update: SessionUpdate) -> Result<(), PersistenceError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(id) {
            Some(stored) => {
                update.apply_to(stored);
                Ok(())
            }
            None => match update {
                SessionUpdate::Replace(state) => {
                    sessions.insert(id.clone(), *state);
                    Ok(())
                }
                SessionUpdate::Progress { .. } => Err(PersistenceError::NotFound(id.clone())),
            },
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), PersistenceError> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, PersistenceError> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(SessionState::summary)
            .collect())
    }
}
