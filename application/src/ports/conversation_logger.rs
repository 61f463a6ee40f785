//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording the council
//! transcript: every LLM call with its prompt, response, usage and cost, plus
//! phase boundaries.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! transcript in a machine-readable format (JSONL).

use council_domain::{PhaseKind, SessionId, TokenUsage};
use serde_json::{Value, json};

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "llm_call", "phase_start").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// One completed or failed agent invocation
    pub fn llm_call(
        stage: &str,
        agent: &str,
        prompt: &str,
        response: Result<&str, &str>,
        usage: &TokenUsage,
        cost_usd: f64,
    ) -> Self {
        let (status, text) = match response {
            Ok(text) => ("success", text),
            Err(message) => ("error", message),
        };
        Self::new(
            "llm_call",
            json!({
                "stage": stage,
                "agent": agent,
                "prompt": prompt,
                "status": status,
                "response": text,
                "input_tokens": usage.input_tokens,
                "output_tokens": usage.output_tokens,
                "cost_usd": cost_usd,
            }),
        )
    }

    pub fn phase_start(session: &SessionId, phase: PhaseKind, tasks: usize) -> Self {
        Self::new(
            "phase_start",
            json!({ "session": session, "phase": phase, "tasks": tasks }),
        )
    }

    pub fn phase_end(session: &SessionId, phase: PhaseKind, outcome: &str) -> Self {
        Self::new(
            "phase_end",
            json!({ "session": session, "phase": phase, "outcome": outcome }),
        )
    }
}

/// Port for logging conversation events to a structured log.
///
/// `log` is synchronous and infallible; implementations swallow their own
/// write errors.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_call_payload() {
        let event = ConversationEvent::llm_call(
            "execution",
            "Alice",
            "Q?",
            Err("rate limited"),
            &TokenUsage::default(),
            0.0,
        );
        assert_eq!(event.event_type, "llm_call");
        assert_eq!(event.payload["status"], "error");
        assert_eq!(event.payload["response"], "rate limited");
    }

    #[test]
    fn test_phase_event_payload() {
        let event = ConversationEvent::phase_start(&SessionId::new("s1"), PhaseKind::Review, 3);
        assert_eq!(event.payload["phase"], "review");
        assert_eq!(event.payload["tasks"], 3);
    }
}
