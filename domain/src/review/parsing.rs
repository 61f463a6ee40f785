//! Response parsing for the council flow.
//!
//! These functions extract structured data from free-form agent output.
//! They are pure domain logic: no I/O, just text handling.
//!
//! | Function | Use Case |
//! |----------|----------|
//! | [`extract_summary`] | TLDR of a proposal or critique |
//! | [`parse_review_output`] | Structured JSON critique from a reviewer |

use super::entities::{Critique, Score};
use crate::core::string::{one_line, truncate};
use crate::task::ProposalId;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Maximum length of a summary derived from the response body
pub const SUMMARY_MAX_LEN: usize = 240;

const SUMMARY_MARKERS: [&str; 2] = ["**TLDR:**", "TLDR:"];

/// Extract the TLDR block of a response.
///
/// Looks for a `TLDR:` (or `**TLDR:**`) marker and returns the paragraph that
/// follows it. Without a marker, the whole response collapsed onto one line
/// and truncated to [`SUMMARY_MAX_LEN`] is used instead.
///
/// ```
/// use council_domain::review::parsing::extract_summary;
///
/// let text = "TLDR: Ship it behind a flag.\n\nLonger reasoning follows.";
/// assert_eq!(extract_summary(text), "Ship it behind a flag.");
/// ```
pub fn extract_summary(response: &str) -> String {
    for marker in SUMMARY_MARKERS {
        if let Some((_, rest)) = response.split_once(marker) {
            let block = rest.split("\n\n").next().unwrap_or_default().trim();
            if !block.is_empty() {
                return block.to_string();
            }
        }
    }
    truncate(&one_line(response), SUMMARY_MAX_LEN)
}

/// Structured output of one reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReview {
    pub summary: Option<String>,
    pub critiques: Vec<Critique>,
    pub ranking: Vec<ProposalId>,
}

/// Why a reviewer's output could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewParseError {
    #[error("no JSON object found in review output")]
    NoJson,

    #[error("invalid review JSON: {0}")]
    InvalidJson(String),

    #[error("review contains no usable critiques")]
    NoCritiques,
}

#[derive(Deserialize)]
struct RawReview {
    #[serde(default)]
    overall_tldr: Value,
    #[serde(default)]
    per_proposal: Vec<RawCritique>,
    #[serde(default)]
    overall_ranking: Vec<Value>,
}

#[derive(Deserialize)]
struct RawCritique {
    #[serde(default)]
    proposal_id: Value,
    #[serde(default)]
    score: Value,
    #[serde(default)]
    strengths: Value,
    #[serde(default)]
    weaknesses: Value,
    #[serde(default, alias = "risks")]
    gaps_risks: Value,
    #[serde(default)]
    tldr: Value,
}

/// Parse a reviewer's JSON critique.
///
/// Accepts the JSON object on its own, wrapped in a markdown code fence or
/// surrounded by prose. Critiques are kept only when they reference one of the
/// `presented` proposals and carry a numeric score; scores are clamped into
/// 1-5 and a second critique of the same proposal is ignored. Text fields
/// tolerate `null` and lists of points.
pub fn parse_review_output(
    output: &str,
    presented: &[ProposalId],
) -> Result<ParsedReview, ReviewParseError> {
    let json = extract_json_object(output).ok_or(ReviewParseError::NoJson)?;
    let raw: RawReview =
        serde_json::from_str(json).map_err(|e| ReviewParseError::InvalidJson(e.to_string()))?;

    let allowed: HashSet<ProposalId> = presented.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut critiques = Vec::new();

    for item in raw.per_proposal {
        let Some(id) = parse_proposal_id(&item.proposal_id) else {
            continue;
        };
        if !allowed.contains(&id) || !seen.insert(id) {
            continue;
        }
        let Some(score) = parse_score(&item.score) else {
            continue;
        };
        critiques.push(Critique {
            proposal_id: id,
            score,
            strengths: text_of(&item.strengths),
            weaknesses: text_of(&item.weaknesses),
            risks: text_of(&item.gaps_risks),
            tldr: text_of(&item.tldr),
        });
    }

    if critiques.is_empty() {
        return Err(ReviewParseError::NoCritiques);
    }

    let mut ranked = HashSet::new();
    let ranking = raw
        .overall_ranking
        .iter()
        .filter_map(parse_proposal_id)
        .filter(|id| allowed.contains(id) && ranked.insert(*id))
        .collect();

    Ok(ParsedReview {
        summary: Some(text_of(&raw.overall_tldr)).filter(|s| !s.trim().is_empty()),
        critiques,
        ranking,
    })
}

/// Find the outermost `{ ... }` span of a response.
fn extract_json_object(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (end > start).then(|| &output[start..=end])
}

/// Flatten a free-text field; lists become `; `-separated points.
fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

fn parse_proposal_id(value: &Value) -> Option<ProposalId> {
    match value {
        Value::Number(n) => n.as_u64().map(|v| ProposalId::new(v as usize)),
        Value::String(s) => s
            .trim()
            .trim_start_matches('#')
            .parse::<usize>()
            .ok()
            .map(ProposalId::new),
        _ => None,
    }
}

fn parse_score(value: &Value) -> Option<Score> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().split('/').next()?.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| Score::clamped(number))
}
