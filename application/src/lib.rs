//! Application layer for agent-council
//!
//! This crate contains the orchestration engine, its use cases, port
//! definitions, and engine configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChairmanSettings, EngineConfig};
pub use ports::{
    agent_invoker::{AgentInvocation, AgentInvoker, Invocation, InvocationPurpose, InvokerError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    persistence::{PersistenceError, PersistenceGateway},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::agent_task::AgentTaskRunner;
pub use use_cases::chairman::ChairmanSynthesizer;
pub use use_cases::cost_ledger::{CostLedger, LedgerEntry};
pub use use_cases::engine::{
    CouncilEngine, CouncilOutcome, EngineError, PhaseReport, PhaseTicket, ReviewsReport,
    StartOutcome, StatusReport,
};
pub use use_cases::executor::{BatchObserver, NoObserver, ParallelTaskExecutor};
pub use use_cases::peer_review::{PeerReviewAggregator, ReviewAssignment, plan_reviews};
pub use use_cases::progress_tracker::ProgressTracker;
pub use use_cases::session_store::{Claim, DiscardGuard, PhaseGuard, SessionSlot, SessionStore};
