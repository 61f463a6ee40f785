//! Configuration file loading for agent-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `COUNCIL_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. Global: `$XDG_CONFIG_HOME/agent-council/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileChairmanConfig, FileConfig, FileCouncilConfig,
    FileEngineConfig, FileInvokerConfig, FileLoggingConfig, FileOutputConfig, FileOutputFormat,
    FileStorageConfig, InvokerKind, StorageKind,
};
pub use loader::ConfigLoader;
