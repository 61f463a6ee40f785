//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent_invoker;
pub mod conversation_logger;
pub mod persistence;
pub mod progress;
