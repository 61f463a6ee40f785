//! Orchestration value objects

use crate::task::TokenUsage;
use serde::{Deserialize, Serialize};

/// Final synthesis produced by the chairman
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Name of the chairman agent
    pub chairman: String,
    pub text: String,
    #[serde(default)]
    pub usage: TokenUsage,
    /// Execution generation the verdict was synthesized from
    pub execution_generation: u64,
}

impl Verdict {
    pub fn new(
        chairman: impl Into<String>,
        text: impl Into<String>,
        usage: TokenUsage,
        execution_generation: u64,
    ) -> Self {
        Self {
            chairman: chairman.into(),
            text: text.into(),
            usage,
            execution_generation,
        }
    }
}
