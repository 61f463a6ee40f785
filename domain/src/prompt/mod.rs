//! Prompt domain
//!
//! Templates for generating prompts at each stage of the council flow.

mod template;

pub use template::{PROPOSAL_CHAR_LIMIT, PromptTemplate};
