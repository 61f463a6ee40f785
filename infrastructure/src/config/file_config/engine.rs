//! Engine and chairman configuration from TOML (`[engine]`, `[chairman]`)

use super::ConfigValidationError;
use council_application::config::{
    ChairmanSettings, DEFAULT_PROGRESS_DEBOUNCE, DEFAULT_TASK_TIMEOUT, EngineConfig,
};
use council_domain::{DEFAULT_DOCUMENT_CHAR_LIMIT, ReasoningEffort};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Maximum concurrent tasks per phase (unset = unbounded)
    pub max_concurrency: Option<usize>,
    /// Per-task timeout in seconds (unset = no timeout)
    pub task_timeout_seconds: Option<u64>,
    /// Debounce window for progress writes
    pub progress_debounce_ms: u64,
    /// Leave a reviewer's own proposal out of its batch
    pub exclude_own_proposal: bool,
    /// Character limit applied to each context document
    pub context_char_limit: usize,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            task_timeout_seconds: Some(DEFAULT_TASK_TIMEOUT.as_secs()),
            progress_debounce_ms: DEFAULT_PROGRESS_DEBOUNCE.as_millis() as u64,
            exclude_own_proposal: false,
            context_char_limit: DEFAULT_DOCUMENT_CHAR_LIMIT,
        }
    }
}

impl FileEngineConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_concurrency == Some(0) {
            return Err(ConfigValidationError::ZeroValue("engine.max_concurrency"));
        }
        if self.task_timeout_seconds == Some(0) {
            return Err(ConfigValidationError::ZeroValue("engine.task_timeout_seconds"));
        }
        if self.context_char_limit == 0 {
            return Err(ConfigValidationError::ZeroValue("engine.context_char_limit"));
        }
        Ok(())
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_max_concurrency(self.max_concurrency)
            .with_task_timeout(self.task_timeout_seconds.map(Duration::from_secs))
            .with_progress_debounce(Duration::from_millis(self.progress_debounce_ms))
            .with_exclude_own_proposal(self.exclude_own_proposal)
            .with_context_char_limit(self.context_char_limit)
    }
}

/// Raw chairman configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChairmanConfig {
    pub name: String,
    pub reasoning_effort: ReasoningEffort,
}

impl Default for FileChairmanConfig {
    fn default() -> Self {
        let settings = ChairmanSettings::default();
        Self {
            name: settings.name,
            reasoning_effort: settings.reasoning_effort,
        }
    }
}

impl FileChairmanConfig {
    pub fn to_settings(&self) -> ChairmanSettings {
        ChairmanSettings {
            name: self.name.clone(),
            reasoning_effort: self.reasoning_effort,
        }
    }
}
