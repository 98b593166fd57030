//! Streaming invocation variant.
//!
//! Invokes the backend with trace collection enabled and walks its response
//! units: text chunks accumulate into the result, trace events are forwarded
//! to the client the moment they arrive. On any failure the error text
//! becomes the result and a single `error` frame is delivered — the request
//! is never silently aborted.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use gatehouse_core::{AgentFramework, FrameMessage, Notifier};
use serde_json::Value;
use tracing::error;

use crate::errors::AgentError;
use crate::invoker::{AgentInvoker, InvokeOutcome, InvokeRequest};

/// One unit of a streaming backend response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentEvent {
    /// A piece of the final report text.
    Chunk(String),
    /// An intermediate progress event, forwarded to the client.
    Trace(Value),
}

/// Boxed stream of response units.
pub type AgentEventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send>>;

/// Parameters for one streaming backend invocation.
#[derive(Clone, Copy, Debug)]
pub struct BackendRequest<'a> {
    /// Serialized work-order content.
    pub payload: &'a str,
    /// Correlation token.
    pub session_id: &'a str,
    /// Deployed agent id.
    pub agent_id: &'a str,
    /// Deployed agent alias id.
    pub agent_alias_id: &'a str,
    /// Whether the backend should emit trace events.
    pub trace_enabled: bool,
}

/// The streaming backend seam: one invocation returns an iterator of
/// response units.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Start an invocation and return its unit stream.
    async fn invoke(&self, request: BackendRequest<'_>) -> Result<AgentEventStream, AgentError>;
}

/// Identifiers naming the deployed agent behind the streaming backend.
#[derive(Clone, Debug, Default)]
pub struct BackendIdentifiers {
    /// Deployed agent id.
    pub agent_id: Option<String>,
    /// Deployed agent alias id.
    pub agent_alias_id: Option<String>,
}

impl BackendIdentifiers {
    fn resolve(&self) -> Option<(&str, &str)> {
        Some((self.agent_id.as_deref()?, self.agent_alias_id.as_deref()?))
    }
}

/// The streaming invocation variant.
pub struct InlineInvoker {
    client: Arc<dyn BackendClient>,
    identifiers: BackendIdentifiers,
}

impl InlineInvoker {
    /// Create the variant over a backend client.
    pub fn new(client: Arc<dyn BackendClient>, identifiers: BackendIdentifiers) -> Self {
        Self {
            client,
            identifiers,
        }
    }

    async fn fail(
        &self,
        request: &InvokeRequest,
        notifier: &dyn Notifier,
        text: String,
    ) -> InvokeOutcome {
        error!(request_id = %request.request_id, "{text}");
        notifier
            .send(
                &request.connection_id,
                FrameMessage::error(&request.request_id, &text, AgentFramework::Inline),
            )
            .await;
        InvokeOutcome::failed_notified(text)
    }
}

#[async_trait]
impl AgentInvoker for InlineInvoker {
    async fn invoke(&self, request: &InvokeRequest, notifier: &dyn Notifier) -> InvokeOutcome {
        let Some((agent_id, agent_alias_id)) = self.identifiers.resolve() else {
            let text = format!(
                "Inline agent identifiers not configured. agent_id: {:?}, agent_alias_id: {:?}",
                self.identifiers.agent_id, self.identifiers.agent_alias_id
            );
            return self.fail(request, notifier, text).await;
        };

        let backend_request = BackendRequest {
            payload: &request.payload,
            session_id: &request.session_id,
            agent_id,
            agent_alias_id,
            trace_enabled: true,
        };
        let mut stream = match self.client.invoke(backend_request).await {
            Ok(stream) => stream,
            Err(e) => {
                let text = format!("Error invoking inline agent: {e}");
                return self.fail(request, notifier, text).await;
            }
        };

        let mut completion = String::new();
        while let Some(unit) = stream.next().await {
            match unit {
                Ok(AgentEvent::Chunk(text)) => completion.push_str(&text),
                Ok(AgentEvent::Trace(content)) => {
                    notifier
                        .send(
                            &request.connection_id,
                            FrameMessage::Trace {
                                content,
                                agent_framework: AgentFramework::Inline,
                            },
                        )
                        .await;
                }
                Err(e) => {
                    let text = format!("Error invoking inline agent: {e}");
                    return self.fail(request, notifier, text).await;
                }
            }
        }

        InvokeOutcome::completed(completion)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
