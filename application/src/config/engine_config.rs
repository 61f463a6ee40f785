//! Engine parameters: concurrency, timeouts, debounce and review policy.
//!
//! [`EngineConfig`] groups the static parameters that control how the
//! [`CouncilEngine`](crate::use_cases::engine::CouncilEngine) runs its
//! phases. They are application-layer concerns, not domain policy; the
//! infrastructure config loader builds one from the file config.

use council_domain::{DEFAULT_DOCUMENT_CHAR_LIMIT, ReasoningEffort};
use std::time::Duration;

/// Default debounce window for progress writes
pub const DEFAULT_PROGRESS_DEBOUNCE: Duration = Duration::from_millis(350);

/// Default per-task timeout
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(600);

/// Identity of the synthesis agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChairmanSettings {
    pub name: String,
    pub reasoning_effort: ReasoningEffort,
}

impl Default for ChairmanSettings {
    fn default() -> Self {
        Self {
            name: "Council Chairman".to_string(),
            reasoning_effort: ReasoningEffort::High,
        }
    }
}

/// Engine control parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum number of tasks running at once within a phase (`None` = unbounded)
    pub max_concurrency: Option<usize>,
    /// Time after which an unsettled task is failed with `Timeout` (`None` = never)
    pub task_timeout: Option<Duration>,
    /// Window in which progress reports collapse into one write
    pub progress_debounce: Duration,
    /// Drop a reviewer's own proposal from its review batch
    pub exclude_own_proposal: bool,
    /// Maximum length of each context document embedded in prompts
    pub context_char_limit: usize,
    /// Model name used to price token usage
    pub pricing_model: String,
    pub chairman: ChairmanSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            task_timeout: Some(DEFAULT_TASK_TIMEOUT),
            progress_debounce: DEFAULT_PROGRESS_DEBOUNCE,
            exclude_own_proposal: false,
            context_char_limit: DEFAULT_DOCUMENT_CHAR_LIMIT,
            pricing_model: "gpt-5".to_string(),
            chairman: ChairmanSettings::default(),
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_concurrency(mut self, max: Option<usize>) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_progress_debounce(mut self, debounce: Duration) -> Self {
        self.progress_debounce = debounce;
        self
    }

    pub fn with_exclude_own_proposal(mut self, exclude: bool) -> Self {
        self.exclude_own_proposal = exclude;
        self
    }

    pub fn with_context_char_limit(mut self, limit: usize) -> Self {
        self.context_char_limit = limit;
        self
    }

    pub fn with_pricing_model(mut self, model: impl Into<String>) -> Self {
        self.pricing_model = model.into();
        self
    }

    pub fn with_chairman(mut self, chairman: ChairmanSettings) -> Self {
        self.chairman = chairman;
        self
    }
}
