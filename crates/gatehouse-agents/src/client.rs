//! HTTP backend client for the streaming variant.
//!
//! The backend exposes one invocation endpoint that answers with an SSE
//! stream; each event's data is a JSON unit carrying either a text chunk or
//! a trace event. Units that match neither shape are skipped, not fatal.
//!
//! No retries here: a failed invocation is reported once and becomes the
//! request's result text upstream.

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde_json::{Value, json};
use tracing::warn;

use crate::errors::AgentError;
use crate::inline::{AgentEvent, AgentEventStream, BackendClient, BackendRequest};

/// `BackendClient` over HTTP + SSE.
pub struct HttpBackendClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpBackendClient {
    /// Create a client for the given invocation endpoint.
    ///
    /// `connect_timeout` bounds connection establishment; `invoke_timeout`
    /// bounds the whole invocation including the streamed body — the
    /// dominant share of a request's budget.
    pub fn new(
        endpoint: impl Into<String>,
        connect_timeout: Duration,
        invoke_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(invoke_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn invoke(&self, request: BackendRequest<'_>) -> Result<AgentEventStream, AgentError> {
        let body = json!({
            "inputText": request.payload,
            "agentId": request.agent_id,
            "agentAliasId": request.agent_alias_id,
            "sessionId": request.session_id,
            "enableTrace": request.trace_enabled,
        });
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| std::future::ready(map_event(event)));
        Ok(Box::pin(stream))
    }
}

fn map_event<E: std::fmt::Display>(
    event: Result<eventsource_stream::Event, eventsource_stream::EventStreamError<E>>,
) -> Option<Result<AgentEvent, AgentError>> {
    match event {
        Ok(event) => parse_unit(&event.data),
        Err(e) => Some(Err(AgentError::Stream {
            message: e.to_string(),
        })),
    }
}

/// Decode one SSE data payload into a response unit.
fn parse_unit(data: &str) -> Option<Result<AgentEvent, AgentError>> {
    if data.is_empty() {
        return None;
    }
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "skipping malformed backend response unit");
            return None;
        }
    };
    if let Some(chunk) = value.get("chunk") {
        let text = chunk
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Some(Ok(AgentEvent::Chunk(text)));
    }
    if let Some(trace) = value.get("trace") {
        return Some(Ok(AgentEvent::Trace(trace.clone())));
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
