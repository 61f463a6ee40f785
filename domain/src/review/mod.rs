//! Peer review domain
//!
//! During the Review phase every reviewer critiques the proposals of the
//! current execution set. Critiques are reduced per proposal into an
//! [`AggregatedScore`].
//!
//! ```text
//! ReviewTask (reviewer A) ──┐
//! ReviewTask (reviewer B) ──┼──> aggregate() ──> BTreeMap<ProposalId, AggregatedScore>
//! ReviewTask (reviewer C) ──┘
//! ```

pub mod aggregate;
pub mod entities;
pub mod parsing;

pub use aggregate::{AggregatedScore, aggregate};
pub use entities::{Critique, ReviewSet, ReviewTask, Score};
pub use parsing::{ParsedReview, ReviewParseError, extract_summary, parse_review_output};
