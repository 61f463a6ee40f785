//! Persistence gateway port
//!
//! Session state is written either whole ([`SessionUpdate::Replace`]) or as a
//! debounced merge of one status submap ([`SessionUpdate::Progress`]). The
//! gateway applies each update atomically, so concurrent progress flushes and
//! phase commits never lose each other's keys.

use async_trait::async_trait;
use council_domain::{SessionId, SessionState, SessionSummary, SessionUpdate};
use thiserror::Error;

/// Errors that can occur in the persistence gateway
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Storage error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported schema version {found} (expected {expected})")]
    SchemaMismatch { found: u32, expected: u32 },
}

/// Durable storage of session state
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Load the full state of a session
    async fn load(&self, id: &SessionId) -> Result<SessionState, PersistenceError>;

    /// Apply a partial or full update.
    ///
    /// A `Replace` of an unknown session creates it; a `Progress` update of
    /// an unknown session fails with `NotFound`.
    async fn save(&self, id: &SessionId, update: SessionUpdate) -> Result<(), PersistenceError>;

    /// Remove a session; removing an unknown session is not an error
    async fn delete(&self, id: &SessionId) -> Result<(), PersistenceError>;

    /// Summaries of all stored sessions, in no particular order
    async fn list(&self) -> Result<Vec<SessionSummary>, PersistenceError>;
}
