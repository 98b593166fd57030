//! The agent-invocation capability.

use async_trait::async_trait;
use gatehouse_core::Notifier;

/// One request handed to an invoker.
///
/// Per-request transport context travels here explicitly — never in shared
/// or global state — so a reused execution environment can never leak one
/// client's connection into another's response.
#[derive(Clone, Debug)]
pub struct InvokeRequest {
    /// Serialized work-order content (or the whole message body).
    pub payload: String,
    /// Correlation token passed through to the backend.
    pub session_id: String,
    /// Connection the client is listening on.
    pub connection_id: String,
    /// Correlates frames with this request.
    pub request_id: String,
    /// Push endpoint a delegating backend can use to reach the client
    /// directly.
    pub push_endpoint: String,
}

/// What an invocation produced.
#[derive(Clone, Debug)]
pub struct InvokeOutcome {
    /// The result text: the report on success, a human-readable description
    /// on failure. Never empty silence — the client always sees an outcome.
    pub text: String,
    /// Whether the invocation failed (the text then describes the failure).
    pub failed: bool,
    /// Whether the client has already received this request's terminal
    /// frame. When true the dispatcher must not send another.
    pub client_notified: bool,
}

impl InvokeOutcome {
    /// Successful result; the dispatcher still owes the terminal frame.
    pub fn completed(text: String) -> Self {
        Self {
            text,
            failed: false,
            client_notified: false,
        }
    }

    /// Successful result whose terminal frame was already delivered.
    pub fn completed_notified(text: String) -> Self {
        Self {
            text,
            failed: false,
            client_notified: true,
        }
    }

    /// Failed result whose `error` frame was already delivered.
    pub fn failed_notified(text: String) -> Self {
        Self {
            text,
            failed: true,
            client_notified: true,
        }
    }
}

/// A polymorphic agent backend: turns a payload into report text, emitting
/// zero or more trace frames along the way.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Run the backend. Never returns an error: failures become the result
    /// text (and an `error` frame), so a request always terminates visibly.
    async fn invoke(&self, request: &InvokeRequest, notifier: &dyn Notifier) -> InvokeOutcome;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
