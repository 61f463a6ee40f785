//! Session domain
//!
//! [`SessionState`] is the explicitly typed, versioned state of one council
//! session. Partial writes travel as [`SessionUpdate`]s so that progress
//! submaps can be merged without read-modify-write of the whole document.

pub mod entities;
pub mod update;

pub use entities::{SCHEMA_VERSION, SessionId, SessionState, SessionSummary};
pub use update::{ProgressScope, SessionUpdate};
