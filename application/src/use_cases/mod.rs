//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent_task;
pub mod chairman;
pub mod cost_ledger;
pub mod engine;
pub mod executor;
pub mod peer_review;
pub mod progress_tracker;
pub mod session_store;

#[cfg(test)]
pub(crate) mod test_support;
