//! Session storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Sessions live only for the lifetime of the process
    #[default]
    Memory,
    /// One JSON document per session under `directory`
    File,
}

/// Raw storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub kind: StorageKind,
    pub directory: Option<PathBuf>,
}
