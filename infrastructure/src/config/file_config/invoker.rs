//! Model backend configuration from TOML (`[invoker]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};

/// Which agent invoker adapter to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokerKind {
    /// OpenAI-compatible Responses API over HTTP
    #[default]
    Responses,
    /// Deterministic offline answers
    DryRun,
}

/// Raw invoker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInvokerConfig {
    pub kind: InvokerKind,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub request_timeout_seconds: Option<u64>,
}

impl Default for FileInvokerConfig {
    fn default() -> Self {
        Self {
            kind: InvokerKind::Responses,
            model: "gpt-5".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl FileInvokerConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.request_timeout_seconds == Some(0) {
            return Err(ConfigValidationError::ZeroValue("invoker.request_timeout_seconds"));
        }
        Ok(())
    }
}
