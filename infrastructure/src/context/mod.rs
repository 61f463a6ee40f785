//! Context loading infrastructure
//!
//! Reads background documents from the local file system into
//! [`ContextDocument`](council_domain::ContextDocument)s. Only UTF-8 text is
//! supported; anything else is reported as an error.

mod loader;

pub use loader::{ContextLoadError, LocalContextLoader};
