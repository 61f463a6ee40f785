//! Chairman synthesizer
//!
//! A single downstream task: the chairman reads every successful proposal
//! plus the aggregated critiques and writes the verdict. It goes through the
//! executor so it gets the same timeout and cancellation handling as any
//! batch task.

use crate::config::ChairmanSettings;
use crate::ports::agent_invoker::{AgentInvocation, InvocationPurpose};
use crate::use_cases::agent_task::AgentTaskRunner;
use crate::use_cases::cost_ledger::CostLedger;
use crate::use_cases::executor::{NoObserver, ParallelTaskExecutor};
use council_domain::{
    DomainError, ExecutionSet, FailureKind, PhaseKind, PromptTemplate, ProposalId, Question,
    ReviewSet, ReviewTask, TaskOutcome, Verdict, aggregate,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Produces the final verdict of a session
pub struct ChairmanSynthesizer {
    runner: Arc<AgentTaskRunner>,
    executor: ParallelTaskExecutor,
    settings: ChairmanSettings,
}

impl ChairmanSynthesizer {
    pub fn new(
        runner: Arc<AgentTaskRunner>,
        executor: ParallelTaskExecutor,
        settings: ChairmanSettings,
    ) -> Self {
        Self {
            runner,
            executor,
            settings,
        }
    }

    /// Synthesize a verdict from the proposals and their reviews.
    ///
    /// Fails with `InvalidInput` when there is no successful proposal.
    pub async fn synthesize(
        &self,
        question: &Question,
        executions: &ExecutionSet,
        reviews: &ReviewSet,
        ledger: Arc<CostLedger>,
        cancel: &CancellationToken,
    ) -> TaskOutcome<Verdict> {
        if executions.success_count() == 0 {
            return TaskOutcome::failure(
                FailureKind::InvalidInput,
                DomainError::NoSuccessfulProposals(PhaseKind::Synthesize).to_string(),
            );
        }

        let proposals: Vec<(ProposalId, &str)> = executions
            .successful()
            .filter_map(|t| t.response().map(|r| (t.proposal_id, r)))
            .collect();
        let completed: Vec<&ReviewTask> = reviews.completed().collect();
        let scores = aggregate(completed.iter().copied());

        info!(
            "Chairman synthesizing {} proposals with {} reviews",
            proposals.len(),
            completed.len()
        );

        let invocation = AgentInvocation {
            agent_name: self.settings.name.clone(),
            instructions: PromptTemplate::chairman_instructions().to_string(),
            reasoning_effort: self.settings.reasoning_effort,
            tools_enabled: false,
            prompt: PromptTemplate::chairman_prompt(
                question.content(),
                &proposals,
                &scores,
                &completed,
            ),
            purpose: InvocationPurpose::Synthesis,
        };

        let runner = self.runner.clone();
        let generation = executions.generation;
        let task = async move {
            runner
                .invoke("chairman", &invocation, &ledger)
                .await
                .map(|result| {
                    Verdict::new(
                        invocation.agent_name.clone(),
                        result.response,
                        result.usage,
                        generation,
                    )
                })
        };

        self.executor
            .run_batch(vec![task], cancel, Arc::new(NoObserver))
            .await
            .pop()
            .unwrap_or_else(|| TaskOutcome::failure(FailureKind::Aborted, "chairman task missing"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::agent_invoker::InvokerError;
    use crate::ports::conversation_logger::NoConversationLogger;
    use crate::use_cases::test_support::MockInvoker;
    use council_domain::{
        AgentSpec, Critique, ExecutionTask, ModelPricing, ReasoningEffort, Score, TaskResult,
        TaskStatus, TokenUsage,
    };
    use std::time::Duration;

    fn executions(ok: bool) -> ExecutionSet {
        let outcome = if ok {
            TaskOutcome::Success(TaskResult {
                response: "Use Rust.".into(),
                summary: "Use Rust.".into(),
                tools_used: vec![],
                usage: TokenUsage::default(),
            })
        } else {
            TaskOutcome::failure(FailureKind::Timeout, "slow")
        };
        ExecutionSet::new(
            7,
            vec![ExecutionTask::settled(
                ProposalId::new(0),
                AgentSpec::new("A", "Engineer"),
                outcome,
            )],
        )
    }

    fn reviews() -> ReviewSet {
        ReviewSet::new(
            7,
            vec![ReviewTask {
                reviewer: "A".into(),
                status: TaskStatus::Done,
                reviewed: vec![ProposalId::new(0)],
                critiques: vec![Critique {
                    proposal_id: ProposalId::new(0),
                    score: Score::new(5).unwrap(),
                    strengths: "fast".into(),
                    weaknesses: String::new(),
                    risks: String::new(),
                    tldr: "great".into(),
                }],
                summary: None,
                ranking: vec![],
                tools_used: vec![],
                usage: TokenUsage::default(),
                error: None,
            }],
        )
    }

    fn chairman(invoker: Arc<MockInvoker>, executor: ParallelTaskExecutor) -> ChairmanSynthesizer {
        let runner = Arc::new(AgentTaskRunner::new(invoker, Arc::new(NoConversationLogger)));
        ChairmanSynthesizer::new(runner, executor, ChairmanSettings::default())
    }

    #[tokio::test]
    async fn test_synthesize_produces_verdict() {
        let invoker = Arc::new(MockInvoker::new());
        let ledger = Arc::new(CostLedger::new(ModelPricing::DEFAULT));

        let outcome = chairman(invoker.clone(), ParallelTaskExecutor::new())
            .synthesize(
                &Question::try_new("Which language?").unwrap(),
                &executions(true),
                &reviews(),
                ledger.clone(),
                &CancellationToken::new(),
            )
            .await;

        let verdict = outcome.into_result().unwrap();
        assert_eq!(verdict.chairman, "Council Chairman");
        assert_eq!(verdict.execution_generation, 7);
        assert!(!verdict.text.is_empty());
        assert_eq!(ledger.snapshot().calls, 1);

        let calls = invoker.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].tools_enabled);
        assert_eq!(calls[0].reasoning_effort, ReasoningEffort::High);
        assert!(calls[0].prompt.contains("Proposal #0: mean 5.00 from 1 review(s)"));
    }

    #[tokio::test]
    async fn test_rejects_without_successful_proposals() {
        let invoker = Arc::new(MockInvoker::new());
        let outcome = chairman(invoker.clone(), ParallelTaskExecutor::new())
            .synthesize(
                &Question::try_new("Q?").unwrap(),
                &executions(false),
                &reviews(),
                Arc::new(CostLedger::new(ModelPricing::DEFAULT)),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.as_failure().unwrap().kind, FailureKind::InvalidInput);
        assert!(invoker.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invoker_failure_is_data() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.fail("Council Chairman", "synthesis", InvokerError::Transient("503".into()));

        let outcome = chairman(invoker, ParallelTaskExecutor::new())
            .synthesize(
                &Question::try_new("Q?").unwrap(),
                &executions(true),
                &reviews(),
                Arc::new(CostLedger::new(ModelPricing::DEFAULT)),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.as_failure().unwrap().kind, FailureKind::Transient);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chairman_timeout() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.delay("Council Chairman", Duration::from_secs(60));
        let executor = ParallelTaskExecutor::new().with_task_timeout(Some(Duration::from_secs(5)));
        let ledger = Arc::new(CostLedger::new(ModelPricing::DEFAULT));

        let outcome = chairman(invoker, executor)
            .synthesize(
                &Question::try_new("Q?").unwrap(),
                &executions(true),
                &reviews(),
                ledger.clone(),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.as_failure().unwrap().kind, FailureKind::Timeout);
        assert_eq!(ledger.snapshot().calls, 1);
    }
}
