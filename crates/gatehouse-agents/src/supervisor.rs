//! Delegating invocation variant.
//!
//! The supervisor service receives the payload plus enough transport
//! metadata (connection id + push endpoint) to stream trace frames directly
//! to the client, bypassing the gateway. The gateway blocks on the
//! synchronous structured result, extracts and cleans the final text, and
//! delivers this variant's terminal frame itself. Every path through this
//! invoker notifies the client, so the outcome always reports
//! `client_notified` and the dispatcher stays silent — exactly one terminal
//! frame per request.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use gatehouse_core::html::clean_html;
use gatehouse_core::{AgentFramework, FrameMessage, Notifier, RequestStatus};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::errors::AgentError;
use crate::extract::extract_final_text;
use crate::invoker::{AgentInvoker, InvokeOutcome, InvokeRequest};

/// The delegating invocation variant.
pub struct SupervisorInvoker {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl SupervisorInvoker {
    /// Create the variant for a supervisor service endpoint.
    ///
    /// `invoke_timeout` bounds the whole synchronous call; the supervisor's
    /// reasoning dominates the request budget.
    pub fn new(
        endpoint: Option<String>,
        invoke_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(invoke_timeout).build()?;
        Ok(Self { http, endpoint })
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
                FrameMessage::error(&request.request_id, &text, AgentFramework::Supervisor),
            )
            .await;
        InvokeOutcome::failed_notified(text)
    }
}

#[async_trait]
impl AgentInvoker for SupervisorInvoker {
    async fn invoke(&self, request: &InvokeRequest, notifier: &dyn Notifier) -> InvokeOutcome {
        let Some(endpoint) = self.endpoint.as_deref() else {
            let text = "Supervisor agent endpoint not configured".to_string();
            return self.fail(request, notifier, text).await;
        };

        notifier
            .send(
                &request.connection_id,
                FrameMessage::Trace {
                    content: json!({
                        "trace": {
                            "orchestrationTrace": {
                                "invocationInput": {
                                    "invocationType": "SUPERVISOR_AGENT",
                                    "text": "Initializing safety supervisor agent"
                                }
                            }
                        }
                    }),
                    agent_framework: AgentFramework::Supervisor,
                },
            )
            .await;

        let body = json!({
            "inputText": request.payload,
            "sessionId": request.session_id,
            "connectionId": request.connection_id,
            "pushEndpoint": request.push_endpoint,
            "enableStreaming": true,
        });
        let response = match self.http.post(endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                let text = format!("Error invoking supervisor agent: {e}");
                return self.fail(request, notifier, text).await;
            }
        };

        let status = response.status();
        let body_text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let text = format!("Error reading supervisor result: {e}");
                return self.fail(request, notifier, text).await;
            }
        };
        if !status.is_success() {
            let text = format!("Supervisor agent error ({status}): {body_text}");
            return self.fail(request, notifier, text).await;
        }

        let result: Value = match serde_json::from_str(&body_text) {
            Ok(value) => value,
            Err(e) => {
                let text = format!("Error decoding supervisor result: {e}");
                return self.fail(request, notifier, text).await;
            }
        };
        if let Some(error) = result.get("error") {
            let message = error.as_str().map_or_else(|| error.to_string(), String::from);
            let text = format!("Supervisor agent error: {message}");
            return self.fail(request, notifier, text).await;
        }

        let (extracted, path) = extract_final_text(&result);
        debug!(
            request_id = %request.request_id,
            ?path,
            chars = extracted.len(),
            "extracted supervisor result"
        );
        let cleaned = clean_html(&extracted);

        notifier
            .send(
                &request.connection_id,
                FrameMessage::Final {
                    request_id: request.request_id.clone(),
                    status: RequestStatus::Completed,
                    safety_check_response: cleaned.clone(),
                    safety_check_performed_at: Utc::now().to_rfc3339(),
                    agent_framework: AgentFramework::Supervisor,
                },
            )
            .await;

        InvokeOutcome::completed_notified(cleaned)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
