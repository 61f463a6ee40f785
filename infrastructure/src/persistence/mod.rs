//! Session persistence adapters
//!
//! Implementations of the
//! [`PersistenceGateway`](council_application::PersistenceGateway) port:
//!
//! - [`InMemoryPersistence`] - process-local map, used for single runs and tests
//! - [`JsonFilePersistence`] - one `state.json` per session directory

mod json_file;
mod memory;

pub use json_file::JsonFilePersistence;
pub use memory::InMemoryPersistence;
