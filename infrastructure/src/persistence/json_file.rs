//! JSON file session storage
//!
//! Layout: `<root>/<session_id>/state.json`. Every write goes to
//! `state.json.tmp` first and is renamed over the old file, so readers never
//! observe a half-written state.

use async_trait::async_trait;
use council_application::ports::persistence::{PersistenceError, PersistenceGateway};
use council_domain::{SCHEMA_VERSION, SessionId, SessionState, SessionSummary, SessionUpdate};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const STATE_FILE: &str = "state.json";

/// Session states stored as pretty-printed JSON documents.
///
/// Updates are serialized through one async lock so that a progress merge
/// (read, merge, write) cannot interleave with a full replacement.
pub struct JsonFilePersistence {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePersistence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_dir(&self, id: &SessionId) -> Result<PathBuf, PersistenceError> {
        let name = id.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
        {
            return Err(PersistenceError::NotFound(id.clone()));
        }
        Ok(self.root.join(name))
    }

    fn state_path(&self, id: &SessionId) -> Result<PathBuf, PersistenceError> {
        Ok(self.session_dir(id)?.join(STATE_FILE))
    }

    async fn read_state(&self, path: &Path, id: &SessionId) -> Result<SessionState, PersistenceError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(id.clone()));
            }
            Err(e) => return Err(io_error(path, e)),
        };

        let state: SessionState = serde_json::from_str(&content)
            .map_err(|e| PersistenceError::Serialization(format!("{}: {}", path.display(), e)))?;
        if state.schema_version != SCHEMA_VERSION {
            return Err(PersistenceError::SchemaMismatch {
                found: state.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(state)
    }

    async fn write_atomic(&self, path: &Path, state: &SessionState) -> Result<(), PersistenceError> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| io_error(&tmp_path, e))?;
        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| io_error(path, e))?;

        debug!("Wrote {} (revision {})", path.display(), state.revision);
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PersistenceError {
    PersistenceError::Io(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl PersistenceGateway for JsonFilePersistence {
    async fn load(&self, id: &SessionId) -> Result<SessionState, PersistenceError> {
        let path = self.state_path(id)?;
        self.read_state(&path, id).await
    }

    async fn save(&self, id: &SessionId, update: SessionUpdate) -> Result<(), PersistenceError> {
        let path = self.state_path(id)?;
        let _guard = self.write_lock.lock().await;

        let state = match update {
            SessionUpdate::Replace(state) => match self.read_state(&path, id).await {
                Ok(stored) if stored.revision > state.revision => {
                    debug!("Skipping stale write for {} (revision {})", id, state.revision);
                    return Ok(());
                }
                _ => *state,
            },
            progress @ SessionUpdate::Progress { .. } => {
                let mut stored = self.read_state(&path, id).await?;
                progress.apply_to(&mut stored);
                stored
            }
        };

        self.write_atomic(&path, &state).await
    }

    async fn delete(&self, id: &SessionId) -> Result<(), PersistenceError> {
        let dir = self.session_dir(id)?;
        let _guard = self.write_lock.lock().await;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&dir, e)),
        }
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, PersistenceError> {
        let mut summaries = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summaries),
            Err(e) => return Err(io_error(&self.root, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.root, e))?
        {
            let id = SessionId::new(entry.file_name().to_string_lossy().into_owned());
            let path = entry.path().join(STATE_FILE);
            if !path.is_file() {
                continue;
            }
            match self.read_state(&path, &id).await {
                Ok(state) => summaries.push(state.summary()),
                Err(e) => warn!("Skipping unreadable session {}: {}", id, e),
            }
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{ProgressScope, Question, SharedContext, TaskStatus};
    use std::collections::BTreeMap;

    fn state(id: &str) -> SessionState {
        SessionState::new(
            SessionId::new(id),
            SharedContext::new(Question::try_new("Should we shard the database?").unwrap()),
            "2026-03-01T09:30:00.000Z",
        )
    }

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path());
        let id = SessionId::new("session_a");

        store.save(&id, SessionUpdate::replace(state("session_a"))).await.unwrap();

        assert!(dir.path().join("session_a").join("state.json").is_file());
        assert!(!dir.path().join("session_a").join("state.json.tmp").exists());
        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded, state("session_a"));
    }

    #[tokio::test]
    async fn test_progress_merges_into_stored_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path());
        let id = SessionId::new("session_b");
        store.save(&id, SessionUpdate::replace(state("session_b"))).await.unwrap();

        for (agent, status) in [("A", TaskStatus::Done), ("B", TaskStatus::Failed)] {
            let mut statuses = BTreeMap::new();
            statuses.insert(agent.to_string(), status);
            store
                .save(&id, SessionUpdate::progress(ProgressScope::Review, statuses))
                .await
                .unwrap();
        }

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.review_status.len(), 2);
        assert_eq!(loaded.review_status["B"], TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_stale_replace_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path());
        let id = SessionId::new("session_c");

        let mut newer = state("session_c");
        newer.touch("2026-03-01T10:00:00.000Z");
        newer.touch("2026-03-01T10:00:01.000Z");
        store.save(&id, SessionUpdate::replace(newer.clone())).await.unwrap();
        store.save(&id, SessionUpdate::replace(state("session_c"))).await.unwrap();

        assert_eq!(store.load(&id).await.unwrap().revision, newer.revision);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path());

        assert!(matches!(
            store.load(&SessionId::new("nope")).await,
            Err(PersistenceError::NotFound(_))
        ));
        assert!(matches!(
            store.load(&SessionId::new("../etc")).await,
            Err(PersistenceError::NotFound(_))
        ));
        assert!(matches!(
            store
                .save(
                    &SessionId::new("nope"),
                    SessionUpdate::progress(ProgressScope::Execution, BTreeMap::new())
                )
                .await,
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path());
        let id = SessionId::new("session_old");

        let mut old = state("session_old");
        old.schema_version = SCHEMA_VERSION + 1;
        let path = dir.path().join("session_old");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("state.json"), serde_json::to_string(&old).unwrap()).unwrap();

        assert!(matches!(
            store.load(&id).await,
            Err(PersistenceError::SchemaMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_skips_garbage_and_delete_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path());
        for id in ["session_1", "session_2"] {
            store
                .save(&SessionId::new(id), SessionUpdate::replace(state(id)))
                .await
                .unwrap();
        }
        let junk = dir.path().join("junk");
        std::fs::create_dir_all(&junk).unwrap();
        std::fs::write(junk.join("state.json"), "{not json").unwrap();

        assert_eq!(store.list().await.unwrap().len(), 2);

        store.delete(&SessionId::new("session_1")).await.unwrap();
        store.delete(&SessionId::new("session_1")).await.unwrap();
        assert!(!dir.path().join("session_1").exists());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_on_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }
}
