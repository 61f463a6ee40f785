//! Responses API invoker over HTTP

use super::protocol::{ResponsesRequest, parse_body, status_error};
use async_trait::async_trait;
use council_application::ports::agent_invoker::{
    AgentInvocation, AgentInvoker, Invocation, InvokerError,
};
use std::time::Duration;
use tracing::debug;

/// Calls `POST {base_url}/responses` with bearer authentication.
///
/// Never retries; every failure is classified and returned to the engine.
#[derive(Clone)]
pub struct ResponsesInvoker {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ResponsesInvoker {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self, InvokerError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| InvokerError::Permanent(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build an invoker reading the API key from `api_key_env`
    pub fn from_env(
        base_url: impl Into<String>,
        api_key_env: &str,
        model: impl Into<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self, InvokerError> {
        let api_key = std::env::var(api_key_env).map_err(|_| {
            InvokerError::Permanent(format!("Missing {} environment variable", api_key_env))
        })?;
        Self::new(base_url, api_key, model, request_timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }
}

fn transport_error(e: reqwest::Error) -> InvokerError {
    if e.is_timeout() {
        InvokerError::Timeout
    } else if e.is_decode() {
        InvokerError::MalformedOutput(e.to_string())
    } else {
        InvokerError::Transient(format!("HTTP request failed: {}", e))
    }
}

#[async_trait]
impl AgentInvoker for ResponsesInvoker {
    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, invocation: &AgentInvocation) -> Result<Invocation, InvokerError> {
        let request = ResponsesRequest::new(&self.model, invocation);
        debug!(
            "POST {} for {} ({})",
            self.endpoint(),
            invocation.agent_name,
            invocation.purpose.as_str()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        let result = parse_body(&body)?;
        debug!(
            "{} answered with {} tokens",
            invocation.agent_name,
            result.usage.total()
        );
        Ok(result)
    }
}
