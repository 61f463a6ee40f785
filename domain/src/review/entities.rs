//! Review entities

use crate::task::{ProposalId, TaskFailure, TaskStatus, TokenUsage};
use serde::{Deserialize, Serialize};

/// Review score on a 1-5 scale (5 = best)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Create a score, returning `None` outside 1-5
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Round and clamp an arbitrary number into the 1-5 range
    pub fn clamped(value: f64) -> Self {
        let rounded = value.round().clamp(Self::MIN as f64, Self::MAX as f64);
        Self(rounded as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value).ok_or_else(|| format!("score {} outside 1-5", value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One reviewer's critique of one proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    pub proposal_id: ProposalId,
    pub score: Score,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
    #[serde(default)]
    pub risks: String,
    /// One or two sentence summary of the critique
    #[serde(default)]
    pub tldr: String,
}

impl Critique {
    /// The comment carried into the aggregation: the summary, or the
    /// weaknesses when no summary was given. `None` when both are blank.
    pub fn comment(&self) -> Option<&str> {
        [self.tldr.trim(), self.weaknesses.trim()]
            .into_iter()
            .find(|c| !c.is_empty())
    }
}

/// A reviewer's pass over the proposal set (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTask {
    /// Name of the reviewing agent
    pub reviewer: String,
    pub status: TaskStatus,
    /// Proposals that were presented to this reviewer
    pub reviewed: Vec<ProposalId>,
    #[serde(default)]
    pub critiques: Vec<Critique>,
    /// Reviewer's overall summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Reviewer's ranking, best first
    #[serde(default)]
    pub ranking: Vec<ProposalId>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
}

impl ReviewTask {
    pub fn failed(
        reviewer: impl Into<String>,
        reviewed: Vec<ProposalId>,
        error: TaskFailure,
    ) -> Self {
        Self {
            reviewer: reviewer.into(),
            status: TaskStatus::Failed,
            reviewed,
            critiques: Vec::new(),
            summary: None,
            ranking: Vec::new(),
            tools_used: Vec::new(),
            usage: TokenUsage::default(),
            error: Some(error),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// All review tasks of one Review phase.
///
/// Records the execution generation it was produced against; a review set
/// whose generation differs from the current execution set is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSet {
    pub execution_generation: u64,
    pub reviews: Vec<ReviewTask>,
}

impl ReviewSet {
    pub fn new(execution_generation: u64, reviews: Vec<ReviewTask>) -> Self {
        Self {
            execution_generation,
            reviews,
        }
    }

    pub fn completed(&self) -> impl Iterator<Item = &ReviewTask> {
        self.reviews.iter().filter(|r| r.is_done())
    }

    pub fn success_count(&self) -> usize {
        self.completed().count()
    }
}
