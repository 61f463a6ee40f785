//! Score aggregation across reviewers

use super::entities::{ReviewTask, Score};
use crate::task::ProposalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores and comments collected for one proposal across all reviewers.
///
/// Only exists for proposals referenced by at least one critique, so
/// `scores` is never empty. The mean is computed on read, which keeps the
/// value meaningful while a review phase is still filling it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedScore {
    /// Scores in reviewer order
    pub scores: Vec<Score>,
    /// Non-empty critique comments in reviewer order
    pub comments: Vec<String>,
}

impl AggregatedScore {
    /// Arithmetic mean of the collected scores
    pub fn mean(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.scores.iter().map(|s| s.value() as u32).sum();
        sum as f64 / self.scores.len() as f64
    }

    pub fn count(&self) -> usize {
        self.scores.len()
    }
}

/// Reduce review tasks into per-proposal aggregated scores.
///
/// Keys iterate in ascending proposal id order. A proposal with no critiques
/// is absent from the map rather than present with a zero score.
pub fn aggregate<'a>(
    reviews: impl IntoIterator<Item = &'a ReviewTask>,
) -> BTreeMap<ProposalId, AggregatedScore> {
    let mut aggregated: BTreeMap<ProposalId, AggregatedScore> = BTreeMap::new();

    for review in reviews.into_iter().filter(|r| r.is_done()) {
        for critique in &review.critiques {
            let entry = aggregated.entry(critique.proposal_id).or_default();
            entry.scores.push(critique.score);
            if let Some(comment) = critique.comment() {
                entry.comments.push(comment.to_string());
            }
        }
    }

    aggregated
}
