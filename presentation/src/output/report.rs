//! Snapshot of a session assembled for display

use council_application::{CouncilEngine, EngineError};
use council_domain::{
    AggregatedScore, CostTotals, CouncilPhase, ExecutionTask, ProposalId, ReviewTask, SessionId,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the formatters render, read from the engine in one pass
#[derive(Debug, Clone, Serialize)]
pub struct CouncilReport {
    pub session_id: SessionId,
    pub question: String,
    pub council: Option<String>,
    pub phase: CouncilPhase,
    pub results: Vec<ExecutionTask>,
    pub reviews: Vec<ReviewTask>,
    pub scores: BTreeMap<ProposalId, AggregatedScore>,
    pub verdict: Option<String>,
    pub errors: Vec<String>,
    pub cost: CostTotals,
}

impl CouncilReport {
    pub async fn collect(engine: &CouncilEngine, id: &SessionId) -> Result<Self, EngineError> {
        let state = engine.session_state(id).await?;
        let status = engine.get_status(id).await?;
        let reviews = engine.get_reviews(id).await?;

        Ok(Self {
            session_id: id.clone(),
            question: state.context.question.content().to_string(),
            council: state.council.as_ref().map(|c| c.name.clone()),
            phase: status.phase,
            results: engine.get_results(id).await?,
            reviews: reviews.reviews,
            scores: reviews.scores,
            verdict: engine.get_verdict(id).await?,
            errors: status.errors,
            cost: status.cost,
        })
    }

    /// Mean peer score of a proposal, if it was reviewed
    pub fn mean_score(&self, id: ProposalId) -> Option<f64> {
        self.scores.get(&id).map(AggregatedScore::mean)
    }
}
