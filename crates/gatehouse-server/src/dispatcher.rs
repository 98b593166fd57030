//! The per-event state machine.
//!
//! Routing:
//! - connect → registry put → ack (errors logged, still acked — availability
//!   over strict tracking, and the transport must not retry-storm a broken
//!   teardown)
//! - disconnect → registry delete → ack (same containment)
//! - message → validate body → heartbeat short-circuit → require and verify
//!   token → build payload → run the selected invocation strategy →
//!   normalize → best-effort persistence → terminal frame (unless the
//!   strategy already notified the client)
//!
//! Every failure below the boundary is contained: protocol errors return
//! 400, auth errors 403 (connection stays open for retry, no frame sent),
//! backend failures become result text, delivery and persistence failures
//! are logged and swallowed. A panic anywhere converts to a best-effort
//! `error` frame plus a 500-equivalent; one bad request can never take the
//! process down.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use gatehouse_agents::{AgentInvoker, InvokeRequest};
use gatehouse_auth::TokenVerify;
use gatehouse_core::html::{clean_html, extract_html};
use gatehouse_core::{AgentFramework, FrameMessage, InboundMessage, Notifier, RequestStatus};
use gatehouse_store::{ConnectionRegistry, WorkOrderStore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Transport events consumed by the gateway.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// A client opened a connection.
    Connect {
        /// Opaque connection id assigned by the transport.
        connection_id: String,
    },
    /// A client's connection closed.
    Disconnect {
        /// The closing connection's id.
        connection_id: String,
    },
    /// A client sent a message.
    Message {
        /// Connection the message arrived on.
        connection_id: String,
        /// Raw message body, if any.
        body: Option<String>,
        /// Push endpoint reconstructed from the event's host metadata; a
        /// delegating backend uses it to reach the client directly.
        push_endpoint: String,
    },
}

impl TransportEvent {
    fn connection_id(&self) -> &str {
        match self {
            Self::Connect { connection_id }
            | Self::Disconnect { connection_id }
            | Self::Message { connection_id, .. } => connection_id,
        }
    }
}

/// HTTP-equivalent response returned to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventResponse {
    /// HTTP-equivalent status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl EventResponse {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    fn bad_request(body: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: body.into(),
        }
    }

    fn forbidden(body: impl Into<String>) -> Self {
        Self {
            status: 403,
            body: body.into(),
        }
    }

    fn internal(body: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: body.into(),
        }
    }
}

/// Everything the dispatcher orchestrates, injected at the trait seams.
pub struct DispatcherDeps {
    /// Durable connection registry.
    pub registry: Arc<dyn ConnectionRegistry>,
    /// Bearer-token verifier.
    pub verifier: Arc<dyn TokenVerify>,
    /// External work-order store.
    pub work_orders: Arc<dyn WorkOrderStore>,
    /// Frame delivery.
    pub notifier: Arc<dyn Notifier>,
    /// Streaming invocation variant.
    pub inline: Arc<dyn AgentInvoker>,
    /// Delegating invocation variant.
    pub supervisor: Arc<dyn AgentInvoker>,
    /// Registry entry lifetime.
    pub connection_ttl: Duration,
}

/// The top-level state machine: one instance serves every event.
pub struct Dispatcher {
    deps: DispatcherDeps,
}

impl Dispatcher {
    /// Create a dispatcher over its collaborators.
    pub fn new(deps: DispatcherDeps) -> Self {
        Self { deps }
    }

    /// Handle one transport event, containing every failure at this
    /// boundary.
    pub async fn dispatch(&self, event: TransportEvent) -> EventResponse {
        let connection_id = event.connection_id().to_string();
        let is_message = matches!(event, TransportEvent::Message { .. });

        match AssertUnwindSafe(self.dispatch_inner(event)).catch_unwind().await {
            Ok(response) => response,
            Err(_) => {
                error!(connection_id, "event handling panicked");
                if is_message {
                    self.deps
                        .notifier
                        .send(
                            &connection_id,
                            FrameMessage::error(
                                "unknown",
                                "Error in performing safety check: internal error",
                                AgentFramework::Inline,
                            ),
                        )
                        .await;
                }
                EventResponse::internal("Internal server error")
            }
        }
    }

    async fn dispatch_inner(&self, event: TransportEvent) -> EventResponse {
        match event {
            TransportEvent::Connect { connection_id } => self.handle_connect(&connection_id).await,
            TransportEvent::Disconnect { connection_id } => {
                self.handle_disconnect(&connection_id).await
            }
            TransportEvent::Message {
                connection_id,
                body,
                push_endpoint,
            } => {
                self.handle_message(&connection_id, body.as_deref(), &push_endpoint)
                    .await
            }
        }
    }

    async fn handle_connect(&self, connection_id: &str) -> EventResponse {
        info!(connection_id, "new connection");
        if let Err(e) = self
            .deps
            .registry
            .put(connection_id, self.deps.connection_ttl)
            .await
        {
            error!(connection_id, error = %e, "failed to record connection");
        }
        EventResponse::ok("Connected")
    }

    async fn handle_disconnect(&self, connection_id: &str) -> EventResponse {
        info!(connection_id, "disconnection");
        if let Err(e) = self.deps.registry.delete(connection_id).await {
            error!(connection_id, error = %e, "failed to remove connection");
        }
        EventResponse::ok("Disconnected")
    }

    async fn handle_message(
        &self,
        connection_id: &str,
        body: Option<&str>,
        push_endpoint: &str,
    ) -> EventResponse {
        let Some(body) = body.filter(|b| !b.is_empty()) else {
            warn!(connection_id, "missing or empty message body");
            return EventResponse::bad_request("Missing request body");
        };
        let message = match InboundMessage::parse(body) {
            Ok(message) => message,
            Err(e) => {
                warn!(connection_id, error = %e, "invalid JSON in message body");
                return EventResponse::bad_request("Invalid JSON in request body");
            }
        };

        if message.is_heartbeat() {
            debug!(connection_id, "heartbeat received");
            return EventResponse::ok(r#"{"message":"Heartbeat received, no action taken"}"#);
        }

        let Some(token) = message.token.as_deref() else {
            warn!(connection_id, "token missing in request");
            return EventResponse::forbidden("Token is required");
        };
        let claims = match self.deps.verifier.verify(token).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(connection_id, error = %e, "token verification failed");
                return EventResponse::forbidden("Invalid Token");
            }
        };
        info!(
            connection_id,
            user = claims.log_identity(),
            "processing message"
        );

        self.process(connection_id, &message, push_endpoint).await
    }

    /// Invoke → normalize → persist → terminal frame.
    async fn process(
        &self,
        connection_id: &str,
        message: &InboundMessage,
        push_endpoint: &str,
    ) -> EventResponse {
        let request = InvokeRequest {
            payload: message.backend_payload(),
            session_id: message
                .session_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            connection_id: connection_id.to_string(),
            request_id: Uuid::new_v4().to_string(),
            push_endpoint: push_endpoint.to_string(),
        };
        let framework = message.framework();
        let invoker = match framework {
            AgentFramework::Inline => &self.deps.inline,
            AgentFramework::Supervisor => &self.deps.supervisor,
        };

        let outcome = invoker
            .invoke(&request, self.deps.notifier.as_ref())
            .await;
        let performed_at = Utc::now().to_rfc3339();
        let cleaned = clean_html(&outcome.text);

        // Best-effort persistence; the client's response is unaffected.
        if let Some(work_order_id) = message.work_order_id() {
            let fragment = extract_html(&cleaned);
            if let Err(e) = self
                .deps
                .work_orders
                .update_safety_check(work_order_id, &fragment, &performed_at)
                .await
            {
                error!(work_order_id, error = %e, "failed to persist safety check");
            } else {
                info!(work_order_id, "persisted safety check");
            }
        } else {
            debug!(connection_id, "no work_order_id, skipping persistence");
        }

        // Terminal frame — unless the strategy already notified the client.
        if !outcome.client_notified {
            self.deps
                .notifier
                .send(
                    connection_id,
                    FrameMessage::Final {
                        request_id: request.request_id.clone(),
                        status: RequestStatus::Completed,
                        safety_check_response: cleaned,
                        safety_check_performed_at: performed_at,
                        agent_framework: framework,
                    },
                )
                .await;
        }

        EventResponse::ok("Message sent")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
