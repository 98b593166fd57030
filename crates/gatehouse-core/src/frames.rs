//! Outbound frame envelope and the agent-framework selector.
//!
//! Every server-to-client push is one [`Frame`]: a typed [`FrameMessage`]
//! wrapped with the sending connection id and an RFC 3339 timestamp. A
//! processed request produces zero or more `trace` frames followed by exactly
//! one `final` or `error` frame.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Which backend family served (or should serve) a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentFramework {
    /// Streaming backend invoked in-process; chunks and traces are relayed
    /// by the gateway. The default when a client does not choose.
    #[default]
    #[serde(rename = "InlineAgent")]
    Inline,
    /// Delegating backend: a supervisor service that pushes frames to the
    /// client itself and returns a structured result synchronously.
    #[serde(rename = "SupervisorAgent")]
    Supervisor,
}

impl AgentFramework {
    /// Resolve a wire value. Absent or unrecognized values fall back to
    /// [`AgentFramework::Inline`].
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("SupervisorAgent") => Self::Supervisor,
            _ => Self::Inline,
        }
    }

    /// The wire name of this framework.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Inline => "InlineAgent",
            Self::Supervisor => "SupervisorAgent",
        }
    }
}

/// Terminal status carried by `final` and `error` frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// The request ran to completion and produced a report.
    #[serde(rename = "COMPLETED")]
    Completed,
    /// The request failed; the response text describes the failure.
    #[serde(rename = "FAILED")]
    Failed,
}

/// Typed payload of an outbound frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FrameMessage {
    /// Intermediate progress notification emitted while a backend works.
    #[serde(rename = "trace", rename_all = "camelCase")]
    Trace {
        /// Opaque trace payload, forwarded from the backend verbatim.
        content: serde_json::Value,
        /// Which backend produced the trace.
        agent_framework: AgentFramework,
    },
    /// Terminal frame carrying the finished safety-check report.
    #[serde(rename = "final", rename_all = "camelCase")]
    Final {
        /// Correlates the terminal frame with the request that produced it.
        request_id: String,
        /// Always [`RequestStatus::Completed`] on this variant.
        status: RequestStatus,
        /// The (normalized) report text.
        safety_check_response: String,
        /// RFC 3339 completion timestamp.
        safety_check_performed_at: String,
        /// Which backend served the request.
        agent_framework: AgentFramework,
    },
    /// Terminal frame reporting a failure as human-readable text.
    #[serde(rename = "error", rename_all = "camelCase")]
    Error {
        /// Correlates the terminal frame with the request that produced it.
        request_id: String,
        /// Always [`RequestStatus::Failed`] on this variant.
        status: RequestStatus,
        /// Human-readable description of what went wrong.
        safety_check_response: String,
        /// Which backend was serving the request.
        agent_framework: AgentFramework,
    },
}

impl FrameMessage {
    /// Build an error frame for a failed request.
    pub fn error(request_id: &str, text: &str, framework: AgentFramework) -> Self {
        Self::Error {
            request_id: request_id.to_string(),
            status: RequestStatus::Failed,
            safety_check_response: text.to_string(),
            agent_framework: framework,
        }
    }

    /// The wire tag of this message (`"trace"`, `"final"`, or `"error"`).
    pub fn frame_type(&self) -> &'static str {
        match self {
            Self::Trace { .. } => "trace",
            Self::Final { .. } => "final",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this is a terminal (`final`/`error`) message.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Trace { .. })
    }
}

/// Outbound envelope: one discrete server-to-client push.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    /// The typed payload.
    pub message: FrameMessage,
    /// Connection id the frame is addressed to.
    pub sender: String,
    /// RFC 3339 timestamp taken when the envelope was built. Always a
    /// string on the wire; raw datetime values never serialize.
    pub timestamp: String,
}

impl Frame {
    /// Wrap a message for the given connection, stamping the current time.
    pub fn new(message: FrameMessage, connection_id: &str) -> Self {
        Self {
            message,
            sender: connection_id.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn framework_defaults_to_inline() {
        assert_eq!(AgentFramework::from_wire(None), AgentFramework::Inline);
        assert_eq!(AgentFramework::default(), AgentFramework::Inline);
    }

    #[test]
    fn framework_unrecognized_falls_back_to_inline() {
        assert_eq!(
            AgentFramework::from_wire(Some("SomethingElse")),
            AgentFramework::Inline
        );
    }

    #[test]
    fn framework_supervisor_recognized() {
        assert_eq!(
            AgentFramework::from_wire(Some("SupervisorAgent")),
            AgentFramework::Supervisor
        );
    }

    #[test]
    fn framework_wire_roundtrip() {
        for fw in [AgentFramework::Inline, AgentFramework::Supervisor] {
            assert_eq!(AgentFramework::from_wire(Some(fw.as_wire())), fw);
        }
    }

    #[test]
    fn trace_serializes_with_type_tag() {
        let msg = FrameMessage::Trace {
            content: json!({"step": 1}),
            agent_framework: AgentFramework::Inline,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "trace");
        assert_eq!(value["content"]["step"], 1);
        assert_eq!(value["agentFramework"], "InlineAgent");
    }

    #[test]
    fn final_serializes_camel_case() {
        let msg = FrameMessage::Final {
            request_id: "r1".into(),
            status: RequestStatus::Completed,
            safety_check_response: "<div>ok</div>".into(),
            safety_check_performed_at: "2026-01-01T00:00:00Z".into(),
            agent_framework: AgentFramework::Supervisor,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "final");
        assert_eq!(value["requestId"], "r1");
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["safetyCheckResponse"], "<div>ok</div>");
        assert_eq!(value["safetyCheckPerformedAt"], "2026-01-01T00:00:00Z");
        assert_eq!(value["agentFramework"], "SupervisorAgent");
    }

    #[test]
    fn error_helper_sets_failed_status() {
        let msg = FrameMessage::error("r2", "boom", AgentFramework::Inline);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["safetyCheckResponse"], "boom");
    }

    #[test]
    fn terminal_classification() {
        let trace = FrameMessage::Trace {
            content: json!({}),
            agent_framework: AgentFramework::Inline,
        };
        assert!(!trace.is_terminal());
        assert_eq!(trace.frame_type(), "trace");
        let err = FrameMessage::error("r", "x", AgentFramework::Inline);
        assert!(err.is_terminal());
        assert_eq!(err.frame_type(), "error");
    }

    #[test]
    fn envelope_carries_sender_and_string_timestamp() {
        let frame = Frame::new(
            FrameMessage::error("r", "x", AgentFramework::Inline),
            "conn-1",
        );
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["sender"], "conn-1");
        assert!(value["timestamp"].is_string());
        assert_eq!(value["message"]["type"], "error");
    }

    #[test]
    fn envelope_roundtrip() {
        let frame = Frame::new(
            FrameMessage::Trace {
                content: json!({"a": true}),
                agent_framework: AgentFramework::Supervisor,
            },
            "conn-2",
        );
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sender, "conn-2");
        assert_eq!(back.message.frame_type(), "trace");
    }
}
