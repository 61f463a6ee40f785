//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod council;
mod engine;
mod invoker;
mod output;
mod storage;

pub use council::{FileAgentConfig, FileCouncilConfig};
pub use engine::{FileChairmanConfig, FileEngineConfig};
pub use invoker::{FileInvokerConfig, InvokerKind};
pub use output::{FileLoggingConfig, FileOutputConfig, FileOutputFormat};
pub use storage::{FileStorageConfig, StorageKind};

use council_application::EngineConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    ZeroValue(&'static str),

    #[error("agent name cannot be empty")]
    EmptyAgentName,

    #[error("duplicate agent name: {0}")]
    DuplicateAgentName(String),

    #[error("invoker model cannot be empty")]
    EmptyModelName,

    #[error("storage.directory is required when storage.kind = \"file\"")]
    MissingStorageDirectory,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Default council used when no council file is given
    pub council: FileCouncilConfig,
    /// Engine limits and review policy
    pub engine: FileEngineConfig,
    /// Model backend
    pub invoker: FileInvokerConfig,
    /// Chairman settings
    pub chairman: FileChairmanConfig,
    /// Session storage
    pub storage: FileStorageConfig,
    /// Conversation transcript
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.engine.validate()?;
        self.invoker.validate()?;

        let mut seen = HashSet::new();
        for agent in &self.council.agents {
            let name = agent.name.trim();
            if name.is_empty() {
                return Err(ConfigValidationError::EmptyAgentName);
            }
            if !seen.insert(name.to_string()) {
                return Err(ConfigValidationError::DuplicateAgentName(name.to_string()));
            }
        }

        if self.storage.kind == StorageKind::File && self.storage.directory.is_none() {
            return Err(ConfigValidationError::MissingStorageDirectory);
        }
        Ok(())
    }

    /// Build the engine parameters from the `[engine]`, `[invoker]` and
    /// `[chairman]` sections
    pub fn engine_config(&self) -> EngineConfig {
        self.engine
            .to_engine_config()
            .with_pricing_model(self.invoker.model.clone())
            .with_chairman(self.chairman.to_settings())
    }
}
