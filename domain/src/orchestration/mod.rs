//! Orchestration domain
//!
//! The session pipeline and its artifacts:
//!
//! ```text
//! Input ─build─> Built ─edit─> Edited ─execute─> Executed ─review─> Reviewed ─synthesize─> Synthesized ─> Complete
//!                  └──────────execute──────────────┘
//! ```
//!
//! - [`phase`] - the phase machine: preconditions, completion flags, cascading invalidation
//! - [`value_objects`] - the chairman's [`Verdict`](value_objects::Verdict)

pub mod phase;
pub mod value_objects;
