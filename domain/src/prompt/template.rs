//! Prompt templates for the council flow

use crate::context::SharedContext;
use crate::core::string::truncate_marked;
use crate::review::{AggregatedScore, ReviewTask};
use crate::task::ProposalId;
use std::collections::BTreeMap;

/// Maximum length of one proposal embedded in the chairman prompt
pub const PROPOSAL_CHAR_LIMIT: usize = 8_000;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Instructions for a council member answering the question
    pub fn execution_instructions(persona: &str) -> String {
        format!(
            r#"YOUR JOB: Completely, comprehensively, and accurately use the tools at your disposal to fully and thoroughly answer the user's query.

FORMAT REQUIREMENT: Start your response with a 'TLDR:' section (max 2-3 sentences) summarizing your key points, followed by your full detailed response.

YOUR PERSONA: {}"#,
            persona
        )
    }

    /// Prompt shared by every council member during execution
    pub fn execution_prompt(context: &SharedContext, char_limit: usize) -> String {
        let background = context.render_background(char_limit);
        let mut prompt = format!("QUESTION: {}\n", context.question);
        if !background.is_empty() {
            prompt.push('\n');
            prompt.push_str(&background);
        }
        prompt.push_str("\nPlease answer the question based on your role and the provided context.");
        prompt
    }

    /// Instructions for a council member acting as reviewer
    pub fn review_instructions(name: &str, persona: &str) -> String {
        format!("You are {}. {}", name, persona)
    }

    /// Prompt asking a reviewer to critique the presented proposals
    pub fn review_prompt(question: &str, persona: &str, proposals: &[(ProposalId, &str)]) -> String {
        let mut prompt = format!(
            r#"ORIGINAL QUESTION: {}

YOUR PERSONA: {}

TASK:
You have received {} proposals from anonymous council members.
Review them critically based strictly on YOUR persona and expertise.
"#,
            question,
            persona,
            proposals.len()
        );

        for (id, response) in proposals {
            prompt.push_str(&format!("\n--- PROPOSAL #{} ---\n{}\n", id, response));
        }

        prompt.push_str(
            r#"
OUTPUT INSTRUCTIONS:
Return ONLY valid JSON (no markdown). Schema:
{
  "overall_tldr": "string, max 2 sentences",
  "per_proposal": [
    {
      "proposal_id": <int matching the #'s above>,
      "score": <int 1-5, 5 = best>,
      "strengths": "string, well-reasoned",
      "weaknesses": "string, well-reasoned",
      "gaps_risks": "string, well-reasoned",
      "tldr": "1-2 sentence summary of your critique"
    }
  ],
  "overall_ranking": [<proposal_id best to worst>]
}

RULES:
- JSON only. No extra text.
- Critique every proposal listed above exactly once.
- Ranking must reference the proposal_id values above."#,
        );

        prompt
    }

    /// Instructions for the chairman
    pub fn chairman_instructions() -> &'static str {
        r#"You are the Council Chairman. You preside over a council of specialized AI experts.

YOUR GOAL:
Synthesize the best possible response to the user's question by integrating the diverse perspectives, proposals, and critiques from your council members.

PROCESS:
1. Read the original question.
2. Analyze the proposals from your council members.
3. Consider the peer critiques, where members pointed out flaws in each other's work.
4. Filter out noise, weak arguments, or hallucinations identified by peers.
5. Elevate the strongest and most realistic ideas.
6. Draft a cohesive, authoritative final answer.

TONE:
Professional, decisive and nuanced. You are the unified voice of the council.
Do not invent new ideas not present in the council's work unless necessary to bridge gaps.
Do not simply summarize agent-by-agent. Create a unified narrative."#
    }

    /// Prompt for the chairman: anonymised proposals, score table and critiques.
    pub fn chairman_prompt(
        question: &str,
        proposals: &[(ProposalId, &str)],
        scores: &BTreeMap<ProposalId, AggregatedScore>,
        reviews: &[&ReviewTask],
    ) -> String {
        let mut prompt = format!("USER QUESTION: {}\n", question);

        prompt.push_str("\n=== COUNCIL PROPOSALS (Anonymized) ===\n");
        for (id, response) in proposals {
            prompt.push_str(&format!(
                "\n--- Proposal #{} ---\n{}\n",
                id,
                truncate_marked(response, PROPOSAL_CHAR_LIMIT)
            ));
        }

        prompt.push_str("\n=== AGGREGATED PEER SCORES ===\n");
        if scores.is_empty() {
            prompt.push_str("(no scores)\n");
        }
        for (id, score) in scores {
            prompt.push_str(&format!(
                "Proposal #{}: mean {:.2} from {} review(s)\n",
                id,
                score.mean(),
                score.count()
            ));
        }

        prompt.push_str("\n=== PEER REVIEW FEEDBACK (Anonymized) ===\n");
        for (idx, review) in reviews.iter().enumerate() {
            prompt.push_str(&format!("\n[Review {}]\n", idx + 1));
            if let Some(summary) = &review.summary {
                prompt.push_str(&format!("Overall: {}\n", summary));
            }
            for critique in &review.critiques {
                prompt.push_str(&format!(
                    "- Proposal #{} (score {}/5)\n",
                    critique.proposal_id, critique.score
                ));
                for (label, text) in [
                    ("Strengths", &critique.strengths),
                    ("Weaknesses", &critique.weaknesses),
                    ("Gaps/Risks", &critique.risks),
                ] {
                    if !text.trim().is_empty() {
                        prompt.push_str(&format!("  {}: {}\n", label, text.trim()));
                    }
                }
            }
        }

        prompt.push_str(
            "\nBased on the above proposals and rigorous peer critiques, formulate the final answer.",
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextDocument;
    use crate::core::question::Question;
    use crate::review::{Critique, Score, aggregate};
    use crate::task::{TaskStatus, TokenUsage};

    #[test]
    fn test_execution_instructions_request_tldr() {
        let instructions = PromptTemplate::execution_instructions("A skeptical economist");
        assert!(instructions.contains("TLDR:"));
        assert!(instructions.ends_with("YOUR PERSONA: A skeptical economist"));
    }

    #[test]
    fn test_execution_prompt_includes_background() {
        let ctx = SharedContext::new(Question::try_new("Should we migrate?").unwrap())
            .with_documents(vec![ContextDocument::new("notes.txt", "x".repeat(50))]);

        let prompt = PromptTemplate::execution_prompt(&ctx, 10);
        assert!(prompt.starts_with("QUESTION: Should we migrate?"));
        assert!(prompt.contains("--- Source: notes.txt ---"));
        assert!(prompt.contains("xxxxxxxxxx... [truncated]"));
    }

    #[test]
    fn test_execution_prompt_without_documents() {
        let ctx = SharedContext::new(Question::try_new("Q?").unwrap());
        let prompt = PromptTemplate::execution_prompt(&ctx, 100);
        assert!(!prompt.contains("BACKGROUND CONTEXT"));
    }

    #[test]
    fn test_review_prompt_lists_proposals() {
        let proposals = vec![(ProposalId::new(0), "first"), (ProposalId::new(2), "third")];
        let prompt = PromptTemplate::review_prompt("Q?", "Critic", &proposals);

        assert!(prompt.contains("You have received 2 proposals"));
        assert!(prompt.contains("--- PROPOSAL #0 ---\nfirst"));
        assert!(prompt.contains("--- PROPOSAL #2 ---\nthird"));
        assert!(prompt.contains("\"overall_ranking\""));
    }

    #[test]
    fn test_chairman_prompt_is_anonymous_and_ordered() {
        let review = ReviewTask {
            reviewer: "Alice".into(),
            status: TaskStatus::Done,
            reviewed: vec![ProposalId::new(0), ProposalId::new(1)],
            critiques: vec![
                Critique {
                    proposal_id: ProposalId::new(1),
                    score: Score::new(2).unwrap(),
                    strengths: String::new(),
                    weaknesses: "vague".into(),
                    risks: String::new(),
                    tldr: String::new(),
                },
                Critique {
                    proposal_id: ProposalId::new(0),
                    score: Score::new(5).unwrap(),
                    strengths: "clear".into(),
                    weaknesses: String::new(),
                    risks: String::new(),
                    tldr: String::new(),
                },
            ],
            summary: Some("Proposal 0 wins".into()),
            ranking: vec![],
            tools_used: vec![],
            usage: TokenUsage::default(),
            error: None,
        };
        let scores = aggregate([&review]);
        let proposals = vec![(ProposalId::new(0), "a"), (ProposalId::new(1), "b")];

        let prompt = PromptTemplate::chairman_prompt("Q?", &proposals, &scores, &[&review]);

        assert!(!prompt.contains("Alice"));
        let first = prompt.find("Proposal #0: mean 5.00").unwrap();
        let second = prompt.find("Proposal #1: mean 2.00").unwrap();
        assert!(first < second);
        assert!(prompt.contains("Weaknesses: vague"));
    }

    #[test]
    fn test_chairman_prompt_truncates_long_proposals() {
        let long = "y".repeat(PROPOSAL_CHAR_LIMIT + 100);
        let proposals = vec![(ProposalId::new(0), long.as_str())];
        let prompt = PromptTemplate::chairman_prompt("Q?", &proposals, &BTreeMap::new(), &[]);
        assert!(prompt.contains("... [truncated]"));
        assert!(prompt.contains("(no scores)"));
    }
}
