//! Responses API wire format
//!
//! Request and response bodies of `POST {base_url}/responses`, plus the
//! mapping from HTTP status codes to [`InvokerError`]s. Kept free of any
//! HTTP client so it can be exercised without network access.

use council_application::ports::agent_invoker::{AgentInvocation, Invocation, InvokerError};
use council_domain::{ReasoningEffort, TokenUsage};
use serde::{Deserialize, Serialize};

/// Request body
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub instructions: String,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningParam>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolParam>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReasoningParam {
    pub effort: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolParam {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponsesRequest {
    pub fn new(model: &str, invocation: &AgentInvocation) -> Self {
        let reasoning = match invocation.reasoning_effort {
            ReasoningEffort::None => None,
            effort => Some(ReasoningParam {
                effort: effort.as_str(),
            }),
        };
        let tools = if invocation.tools_enabled {
            vec![ToolParam { kind: "web_search" }]
        } else {
            Vec::new()
        };
        Self {
            model: model.to_string(),
            instructions: invocation.instructions.clone(),
            input: invocation.prompt.clone(),
            reasoning,
            tools,
        }
    }
}

/// Response body (only the fields the council reads)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<UsageBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UsageBody {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl ResponsesResponse {
    /// Concatenated `output_text` parts of all message items
    pub fn text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool call item types, e.g. `web_search_call`, in order of appearance
    pub fn tools_used(&self) -> Vec<String> {
        self.output
            .iter()
            .filter(|item| item.kind.ends_with("_call"))
            .map(|item| item.kind.clone())
            .collect()
    }

    pub fn into_invocation(self) -> Invocation {
        let usage = self.usage.unwrap_or_default();
        Invocation {
            response: self.text(),
            tools_used: self.tools_used(),
            usage: TokenUsage::new(usage.input_tokens, usage.output_tokens),
        }
    }
}

/// Parse a raw response body
pub fn parse_body(body: &str) -> Result<Invocation, InvokerError> {
    serde_json::from_str::<ResponsesResponse>(body)
        .map(ResponsesResponse::into_invocation)
        .map_err(|e| InvokerError::MalformedOutput(format!("undecodable response body: {}", e)))
}

/// Map a non-success HTTP status to an invoker error
pub fn status_error(status: u16, body: &str) -> InvokerError {
    let message = format!("HTTP {}: {}", status, truncate_body(body));
    match status {
        429 => InvokerError::RateLimited(message),
        408 => InvokerError::Timeout,
        500..=599 => InvokerError::Transient(message),
        _ => InvokerError::Permanent(message),
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 300;
    if body.len() <= MAX {
        return body.trim();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::ports::agent_invoker::InvocationPurpose;

    fn invocation(effort: ReasoningEffort, tools: bool) -> AgentInvocation {
        AgentInvocation {
            agent_name: "Skeptic".into(),
            instructions: "Be careful".into(),
            reasoning_effort: effort,
            tools_enabled: tools,
            prompt: "QUESTION: ship it?".into(),
            purpose: InvocationPurpose::Proposal,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ResponsesRequest::new(
            "gpt-5",
            &invocation(ReasoningEffort::High, true),
        ))
        .unwrap();
        assert_eq!(body["model"], "gpt-5");
        assert_eq!(body["input"], "QUESTION: ship it?");
        assert_eq!(body["reasoning"]["effort"], "high");
        assert_eq!(body["tools"][0]["type"], "web_search");
    }

    #[test]
    fn test_request_omits_disabled_options() {
        let body = serde_json::to_value(ResponsesRequest::new(
            "gpt-5",
            &invocation(ReasoningEffort::None, false),
        ))
        .unwrap();
        assert!(body.get("reasoning").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_body_collects_text_tools_and_usage() {
        let body = r#"{
            "output": [
                {"type": "web_search_call", "status": "completed"},
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "TLDR: wait. "},
                    {"type": "output_text", "text": "More detail."}
                ]}
            ],
            "usage": {"input_tokens": 1200, "output_tokens": 300, "total_tokens": 1500}
        }"#;
        let invocation = parse_body(body).unwrap();
        assert_eq!(invocation.response, "TLDR: wait. More detail.");
        assert_eq!(invocation.tools_used, vec!["web_search_call".to_string()]);
        assert_eq!(invocation.usage, TokenUsage::new(1200, 300));
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        assert!(matches!(
            parse_body("<html>bad gateway</html>"),
            Err(InvokerError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(429, "slow down"), InvokerError::RateLimited(_)));
        assert!(matches!(status_error(503, ""), InvokerError::Transient(_)));
        assert!(matches!(status_error(408, ""), InvokerError::Timeout));
        assert!(matches!(status_error(401, "bad key"), InvokerError::Permanent(_)));
        assert!(matches!(status_error(400, "bad request"), InvokerError::Permanent(_)));
    }
}
