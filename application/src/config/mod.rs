//! Application-level configuration.
//!
//! - [`EngineConfig`] - concurrency caps, timeouts, debounce and review policy

pub mod engine_config;

pub use engine_config::{
    ChairmanSettings, DEFAULT_PROGRESS_DEBOUNCE, DEFAULT_TASK_TIMEOUT, EngineConfig,
};
