//! Infrastructure layer for agent-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod context;
pub mod invoker;
pub mod logging;
pub mod persistence;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentConfig, FileConfig, FileCouncilConfig,
    FileOutputConfig, FileOutputFormat, InvokerKind, StorageKind,
};
pub use context::{ContextLoadError, LocalContextLoader};
pub use invoker::DryRunInvoker;
#[cfg(feature = "http")]
pub use invoker::ResponsesInvoker;
pub use logging::JsonlConversationLogger;
pub use persistence::{InMemoryPersistence, JsonFilePersistence};
