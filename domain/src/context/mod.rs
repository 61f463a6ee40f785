//! Shared context domain
//!
//! The question and any ingested document text, supplied once per session
//! and handed to every agent. The engine never inspects document structure.

pub mod entities;

pub use entities::{ContextDocument, DEFAULT_DOCUMENT_CHAR_LIMIT, SharedContext};
