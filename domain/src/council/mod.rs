//! Council domain
//!
//! A council is the ordered list of [`AgentSpec`]s configured for a session.
//! The order is significant: the position of an agent at Execute time is the
//! `proposal_id` of its proposal.

pub mod entities;
pub mod reasoning;

pub use entities::{AgentSpec, Council};
pub use reasoning::ReasoningEffort;
