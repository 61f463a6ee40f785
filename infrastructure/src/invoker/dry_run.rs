//! Offline invoker producing deterministic answers

use async_trait::async_trait;
use council_application::ports::agent_invoker::{
    AgentInvocation, AgentInvoker, Invocation, InvocationPurpose, InvokerError,
};
use council_domain::TokenUsage;
use serde_json::json;

/// Answers every invocation without network access.
///
/// Proposals open with a `TLDR:` line, reviews are valid review JSON over
/// exactly the proposals presented, and synthesis returns a short verdict.
/// Token usage is estimated from text length (about four characters per
/// token) so cost reporting has something to show.
#[derive(Debug, Clone)]
pub struct DryRunInvoker {
    model: String,
}

impl DryRunInvoker {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    fn proposal(agent: &str) -> String {
        format!(
            "TLDR: {agent} suggests starting with a small, reversible pilot.\n\n\
             Dry run answer from {agent}. Validate the riskiest assumption first, \
             measure the outcome, then decide whether to expand."
        )
    }

    fn review(agent: &str, invocation: &AgentInvocation, proposal_ids: &[council_domain::ProposalId]) -> String {
        let per_proposal: Vec<_> = proposal_ids
            .iter()
            .map(|id| {
                // Spread scores deterministically so aggregation is visible
                let score = 3 + ((id.index() + agent.len() + invocation.prompt.len()) % 3);
                json!({
                    "proposal_id": id.index(),
                    "score": score,
                    "strengths": "Concrete first step",
                    "weaknesses": "Light on cost estimates",
                    "gaps_risks": "Pilot scope may be too narrow",
                    "tldr": format!("{} finds proposal #{} workable", agent, id),
                })
            })
            .collect();
        json!({
            "overall_tldr": format!("{} reviewed {} proposal(s)", agent, proposal_ids.len()),
            "per_proposal": per_proposal,
            "overall_ranking": proposal_ids.iter().map(|id| id.index()).collect::<Vec<_>>(),
        })
        .to_string()
    }

    fn verdict(agent: &str) -> String {
        format!(
            "{agent} (dry run): the council agrees on a reversible pilot. \
             Start small, track the agreed metrics, and revisit after the first milestone."
        )
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

#[async_trait]
impl AgentInvoker for DryRunInvoker {
    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, invocation: &AgentInvocation) -> Result<Invocation, InvokerError> {
        let agent = invocation.agent_name.as_str();
        let response = match &invocation.purpose {
            InvocationPurpose::Proposal => Self::proposal(agent),
            InvocationPurpose::Review { proposal_ids } => {
                Self::review(agent, invocation, proposal_ids)
            }
            InvocationPurpose::Synthesis => Self::verdict(agent),
        };

        let usage = TokenUsage::new(
            estimate_tokens(&invocation.instructions) + estimate_tokens(&invocation.prompt),
            estimate_tokens(&response),
        );
        Ok(Invocation {
            response,
            tools_used: Vec::new(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{ProposalId, parse_review_output};

    fn invocation(purpose: InvocationPurpose) -> AgentInvocation {
        AgentInvocation {
            agent_name: "Analyst".into(),
            instructions: "Review carefully".into(),
            reasoning_effort: Default::default(),
            tools_enabled: false,
            prompt: "QUESTION: adopt Kafka?".into(),
            purpose,
        }
    }

    #[tokio::test]
    async fn test_proposal_has_tldr() {
        let invoker = DryRunInvoker::new("gpt-5");
        let result = invoker
            .invoke(&invocation(InvocationPurpose::Proposal))
            .await
            .unwrap();
        assert!(result.response.starts_with("TLDR: Analyst"));
        assert!(result.usage.input_tokens > 0);
        assert!(result.usage.output_tokens > 0);
    }

    #[tokio::test]
    async fn test_review_parses_for_presented_proposals() {
        let invoker = DryRunInvoker::new("gpt-5");
        let ids = vec![ProposalId::new(0), ProposalId::new(2)];
        let result = invoker
            .invoke(&invocation(InvocationPurpose::Review {
                proposal_ids: ids.clone(),
            }))
            .await
            .unwrap();

        let parsed = parse_review_output(&result.response, &ids).unwrap();
        assert_eq!(parsed.critiques.len(), 2);
        assert_eq!(parsed.critiques[1].proposal_id, ProposalId::new(2));
        assert!(parsed.critiques.iter().all(|c| (3..=5).contains(&c.score.value())));
    }

    #[tokio::test]
    async fn test_deterministic() {
        let invoker = DryRunInvoker::new("gpt-5");
        let call = invocation(InvocationPurpose::Synthesis);
        let first = invoker.invoke(&call).await.unwrap();
        let second = invoker.invoke(&call).await.unwrap();
        assert_eq!(first.response, second.response);
        assert_eq!(first.usage, second.usage);
        assert_eq!(invoker.model(), "gpt-5");
    }
}
