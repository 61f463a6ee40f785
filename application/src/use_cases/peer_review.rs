//! Peer review aggregator
//!
//! Runs the second wave of tasks: every council member critiques the
//! successful proposals of the current execution set. Critiques are parsed
//! from the reviewer's JSON answer; output that cannot be parsed fails the
//! review task like any other error.

use crate::ports::agent_invoker::{AgentInvocation, InvocationPurpose};
use crate::use_cases::agent_task::AgentTaskRunner;
use crate::use_cases::cost_ledger::CostLedger;
use crate::use_cases::executor::{BatchObserver, ParallelTaskExecutor};
use council_domain::{
    AgentSpec, AggregatedScore, ExecutionSet, FailureKind, PromptTemplate, ProposalId, Question,
    ReviewTask, TaskOutcome, TaskStatus, aggregate, parse_review_output,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reviews settled so far in a running Review phase
pub type LiveReviews = Arc<Mutex<Vec<ReviewTask>>>;

/// One reviewer and the proposals it is asked to critique
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewAssignment {
    pub reviewer: AgentSpec,
    pub proposals: Vec<ProposalId>,
}

/// Decide who reviews what.
///
/// Every agent of the execution set reviews every successful proposal, in
/// proposal order. With `exclude_own`, an agent's own proposal is left out
/// and agents left with nothing to review are skipped.
pub fn plan_reviews(executions: &ExecutionSet, exclude_own: bool) -> Vec<ReviewAssignment> {
    let done: Vec<ProposalId> = executions.successful().map(|t| t.proposal_id).collect();

    executions
        .tasks
        .iter()
        .filter_map(|task| {
            let proposals: Vec<_> = done
                .iter()
                .copied()
                .filter(|id| !(exclude_own && *id == task.proposal_id))
                .collect();
            (!proposals.is_empty()).then(|| ReviewAssignment {
                reviewer: task.agent.clone(),
                proposals,
            })
        })
        .collect()
}

/// Runs review batches and reduces their critiques
pub struct PeerReviewAggregator {
    runner: Arc<AgentTaskRunner>,
    executor: ParallelTaskExecutor,
}

impl PeerReviewAggregator {
    pub fn new(runner: Arc<AgentTaskRunner>, executor: ParallelTaskExecutor) -> Self {
        Self { runner, executor }
    }

    /// Run one review task per assignment.
    ///
    /// Returns one [`ReviewTask`] per assignment, in assignment order. Each
    /// successful review is also appended to `live` as soon as it settles.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        question: &Question,
        executions: &ExecutionSet,
        assignments: &[ReviewAssignment],
        ledger: Arc<CostLedger>,
        cancel: &CancellationToken,
        observer: Arc<dyn BatchObserver>,
        live: LiveReviews,
    ) -> Vec<ReviewTask> {
        info!(
            "Running {} peer reviews over {} proposals",
            assignments.len(),
            executions.success_count()
        );

        let tasks: Vec<_> = assignments
            .iter()
            .map(|assignment| {
                let proposals: Vec<(ProposalId, String)> = assignment
                    .proposals
                    .iter()
                    .filter_map(|id| {
                        executions
                            .get(*id)
                            .and_then(|t| t.response())
                            .map(|r| (*id, r.to_string()))
                    })
                    .collect();
                let reviewer = assignment.reviewer.clone();
                let question = question.content().to_string();
                let runner = self.runner.clone();
                let ledger = ledger.clone();
                let live = live.clone();

                async move {
                    review_once(&runner, &reviewer, &question, &proposals, &ledger, &live).await
                }
            })
            .collect();

        let outcomes = self.executor.run_batch(tasks, cancel, observer).await;

        outcomes
            .into_iter()
            .zip(assignments)
            .map(|(outcome, assignment)| match outcome {
                TaskOutcome::Success(review) => review,
                TaskOutcome::Failure(failure) => ReviewTask::failed(
                    assignment.reviewer.name.clone(),
                    assignment.proposals.clone(),
                    failure,
                ),
            })
            .collect()
    }

    /// Reduce review tasks into per-proposal scores
    pub fn aggregate(reviews: &[ReviewTask]) -> BTreeMap<ProposalId, AggregatedScore> {
        aggregate(reviews)
    }
}

async fn review_once(
    runner: &AgentTaskRunner,
    reviewer: &AgentSpec,
    question: &str,
    proposals: &[(ProposalId, String)],
    ledger: &CostLedger,
    live: &Mutex<Vec<ReviewTask>>,
) -> TaskOutcome<ReviewTask> {
    let presented: Vec<ProposalId> = proposals.iter().map(|(id, _)| *id).collect();
    let texts: Vec<(ProposalId, &str)> = proposals.iter().map(|(id, r)| (*id, r.as_str())).collect();

    let invocation = AgentInvocation {
        agent_name: reviewer.name.clone(),
        instructions: PromptTemplate::review_instructions(&reviewer.name, &reviewer.persona),
        reasoning_effort: reviewer.reasoning_effort,
        tools_enabled: reviewer.enable_web_search,
        prompt: PromptTemplate::review_prompt(question, &reviewer.persona, &texts),
        purpose: InvocationPurpose::Review {
            proposal_ids: presented.clone(),
        },
    };

    let result = match runner.invoke("review", &invocation, ledger).await {
        TaskOutcome::Success(result) => result,
        TaskOutcome::Failure(failure) => return TaskOutcome::Failure(failure),
    };

    match parse_review_output(&result.response, &presented) {
        Ok(parsed) => {
            let review = ReviewTask {
                reviewer: reviewer.name.clone(),
                status: TaskStatus::Done,
                reviewed: presented,
                critiques: parsed.critiques,
                summary: parsed.summary,
                ranking: parsed.ranking,
                tools_used: result.tools_used,
                usage: result.usage,
                error: None,
            };
            live.lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(review.clone());
            TaskOutcome::Success(review)
        }
        Err(e) => {
            warn!("Review by {} could not be parsed: {}", reviewer.name, e);
            TaskOutcome::failure(FailureKind::MalformedOutput, e.to_string())
        }
    }
}
