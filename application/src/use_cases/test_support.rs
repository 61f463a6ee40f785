//! Test doubles shared by the use case tests

use crate::ports::agent_invoker::{
    AgentInvocation, AgentInvoker, Invocation, InvocationPurpose, InvokerError,
};
use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use async_trait::async_trait;
use council_domain::{SessionId, SessionState, SessionSummary, SessionUpdate, TokenUsage};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Scriptable invoker.
///
/// Without a script it answers like a well-behaved agent: a proposal with a
/// TLDR, a valid review of every presented proposal, or a verdict.
pub struct MockInvoker {
    scripted: Mutex<HashMap<String, VecDeque<Result<Invocation, InvokerError>>>>,
    failures: Mutex<HashMap<(String, &'static str), InvokerError>>,
    delays: Mutex<HashMap<String, Duration>>,
    review_score: Mutex<u8>,
    calls: Mutex<Vec<AgentInvocation>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            review_score: Mutex::new(4),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-off result for the agent's next call
    pub fn respond(&self, agent: &str, result: Result<Invocation, InvokerError>) {
        self.scripted
            .lock()
            .unwrap()
            .entry(agent.to_string())
            .or_default()
            .push_back(result);
    }

    /// Fail every call of `agent` for the given purpose ("proposal", "review", "synthesis")
    pub fn fail(&self, agent: &str, purpose: &'static str, error: InvokerError) {
        self.failures
            .lock()
            .unwrap()
            .insert((agent.to_string(), purpose), error);
    }

    pub fn delay(&self, agent: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(agent.to_string(), delay);
    }

    pub fn set_review_score(&self, score: u8) {
        *self.review_score.lock().unwrap() = score;
    }

    pub fn calls(&self) -> Vec<AgentInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, purpose: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.purpose.as_str() == purpose)
            .count()
    }
}

#[async_trait]
impl AgentInvoker for MockInvoker {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn invoke(&self, invocation: &AgentInvocation) -> Result<Invocation, InvokerError> {
        self.calls.lock().unwrap().push(invocation.clone());

        let delay = self.delays.lock().unwrap().get(&invocation.agent_name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(&invocation.agent_name)
            .and_then(|queue| queue.pop_front());
        if let Some(result) = scripted {
            return result;
        }

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get(&(invocation.agent_name.clone(), invocation.purpose.as_str()))
            .cloned();
        if let Some(error) = failure {
            return Err(error);
        }

        let response = match &invocation.purpose {
            InvocationPurpose::Proposal => format!(
                "TLDR: {} recommends a plan.\n\nDetailed reasoning from {}.",
                invocation.agent_name, invocation.agent_name
            ),
            InvocationPurpose::Review { proposal_ids } => {
                let score = *self.review_score.lock().unwrap();
                let per_proposal: Vec<_> = proposal_ids
                    .iter()
                    .map(|id| {
                        serde_json::json!({
                            "proposal_id": id.index(),
                            "score": score,
                            "strengths": "clear",
                            "weaknesses": "thin on risks",
                            "gaps_risks": "none noted",
                            "tldr": format!("{} on #{}", invocation.agent_name, id),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "overall_tldr": "Reviewed all proposals.",
                    "per_proposal": per_proposal,
                    "overall_ranking": proposal_ids.iter().map(|id| id.index()).collect::<Vec<_>>(),
                })
                .to_string()
            }
            InvocationPurpose::Synthesis => "The council recommends the combined plan.".to_string(),
        };

        Ok(Invocation {
            response,
            tools_used: Vec::new(),
            usage: TokenUsage::new(100, 50),
        })
    }
}

/// In-memory gateway that records every update it receives
pub struct RecordingPersistence {
    states: Mutex<HashMap<SessionId, SessionState>>,
    log: Mutex<Vec<SessionUpdate>>,
    failing: AtomicBool,
    save_delay: Mutex<Option<Duration>>,
}

impl RecordingPersistence {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            save_delay: Mutex::new(None),
        }
    }

    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every later save wait `delay` before it lands
    pub fn delay_saves(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = Some(delay);
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn progress_writes(&self) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|u| matches!(u, SessionUpdate::Progress { .. }))
            .count()
    }

    pub fn replace_writes(&self) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|u| matches!(u, SessionUpdate::Replace(_)))
            .count()
    }

    pub fn stored(&self, id: &SessionId) -> Option<SessionState> {
        self.states.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl PersistenceGateway for RecordingPersistence {
    async fn load(&self, id: &SessionId) -> Result<SessionState, PersistenceError> {
        self.stored(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))
    }

    async fn save(&self, id: &SessionId, update: SessionUpdate) -> Result<(), PersistenceError> {
        let delay = *self.save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io("storage offline".into()));
        }
        self.log.lock().unwrap().push(update.clone());

        let mut states = self.states.lock().unwrap();
        match states.get_mut(id) {
            Some(stored) => {
                update.apply_to(stored);
            }
            None => match update {
                SessionUpdate::Replace(state) => {
                    states.insert(id.clone(), *state);
                }
                SessionUpdate::Progress { .. } => return Err(PersistenceError::NotFound(id.clone())),
            },
        }
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), PersistenceError> {
        self.states.lock().unwrap().remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, PersistenceError> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .values()
            .map(SessionState::summary)
            .collect())
    }
}
