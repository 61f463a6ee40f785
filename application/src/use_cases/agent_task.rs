//! Agent task runner
//!
//! Runs one agent against the shared context and turns whatever happens into
//! a [`TaskOutcome`]. Invoker errors become `Failure` data here and never
//! reach the batch.

use crate::ports::agent_invoker::{AgentInvocation, AgentInvoker, InvocationPurpose, Invocation};
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::use_cases::cost_ledger::CostLedger;
use council_domain::{
    AgentSpec, FailureKind, PromptTemplate, SharedContext, TaskFailure, TaskOutcome, TaskResult,
    TokenUsage, extract_summary,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes single agent invocations with failure isolation
pub struct AgentTaskRunner {
    invoker: Arc<dyn AgentInvoker>,
    logger: Arc<dyn ConversationLogger>,
}

impl AgentTaskRunner {
    pub fn new(invoker: Arc<dyn AgentInvoker>, logger: Arc<dyn ConversationLogger>) -> Self {
        Self { invoker, logger }
    }

    /// Model name of the underlying invoker
    pub fn model(&self) -> &str {
        self.invoker.model()
    }

    pub fn invoker(&self) -> Arc<dyn AgentInvoker> {
        self.invoker.clone()
    }

    /// Produce one agent's proposal for the Execute phase.
    ///
    /// An agent with an empty name or persona fails with `InvalidInput`
    /// without invoking anything.
    pub async fn run(
        &self,
        agent: &AgentSpec,
        context: &SharedContext,
        char_limit: usize,
        ledger: &CostLedger,
    ) -> TaskOutcome {
        if let Err(e) = agent.validate() {
            return TaskOutcome::failure(FailureKind::InvalidInput, e.to_string());
        }

        let invocation = AgentInvocation {
            agent_name: agent.name.clone(),
            instructions: PromptTemplate::execution_instructions(&agent.persona),
            reasoning_effort: agent.reasoning_effort,
            tools_enabled: agent.enable_web_search,
            prompt: PromptTemplate::execution_prompt(context, char_limit),
            purpose: InvocationPurpose::Proposal,
        };

        self.invoke("execution", &invocation, ledger)
            .await
            .map(|result| TaskResult {
                summary: extract_summary(&result.response),
                response: result.response,
                tools_used: result.tools_used,
                usage: result.usage,
            })
    }

    /// Run an invocation, recording exactly one ledger entry for the attempt.
    ///
    /// A blank response is treated as malformed output.
    pub async fn invoke(
        &self,
        stage: &str,
        invocation: &AgentInvocation,
        ledger: &CostLedger,
    ) -> TaskOutcome<Invocation> {
        let entry = ledger.begin();
        debug!("Invoking {} for {}", invocation.agent_name, stage);

        match self.invoker.invoke(invocation).await {
            Ok(result) => {
                let cost = entry.settle(&result.usage);
                self.logger.log(ConversationEvent::llm_call(
                    stage,
                    &invocation.agent_name,
                    &invocation.prompt,
                    Ok(&result.response),
                    &result.usage,
                    cost,
                ));
                if result.response.trim().is_empty() {
                    warn!("{} returned an empty response", invocation.agent_name);
                    return TaskOutcome::failure(FailureKind::MalformedOutput, "empty response");
                }
                TaskOutcome::Success(result)
            }
            Err(e) => {
                let usage = TokenUsage::default();
                let cost = entry.settle(&usage);
                warn!("{} failed during {}: {}", invocation.agent_name, stage, e);
                let message = e.to_string();
                self.logger.log(ConversationEvent::llm_call(
                    stage,
                    &invocation.agent_name,
                    &invocation.prompt,
                    Err(&message),
                    &usage,
                    cost,
                ));
                TaskOutcome::Failure(TaskFailure::new(e.failure_kind(), message))
            }
        }
    }
}
