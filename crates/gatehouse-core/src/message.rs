//! Inbound message wire shape.
//!
//! Everything is optional at parse time; the dispatcher enforces presence
//! rules (token required for requests, heartbeats short-circuit, etc.).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::frames::AgentFramework;

/// A client → gateway message, as decoded from the transport body.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Bearer token; required for anything other than a heartbeat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Client-supplied correlation id; the gateway generates one if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Requested backend family; unrecognized values fall back to the
    /// streaming default.
    #[serde(
        rename = "agentFramework",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_framework: Option<String>,
    /// Work-order content; when present, the backend sees only this
    /// sub-object rather than the full envelope.
    #[serde(
        rename = "workOrderDetails",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub work_order_details: Option<Value>,
    /// `"heartbeat"` keeps the connection warm without any processing.
    #[serde(
        rename = "messageType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message_type: Option<String>,
}

impl InboundMessage {
    /// Decode a transport body. Non-object bodies are a parse error.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Whether this message is a heartbeat.
    pub fn is_heartbeat(&self) -> bool {
        self.message_type.as_deref() == Some("heartbeat")
    }

    /// Resolve the requested backend family.
    pub fn framework(&self) -> AgentFramework {
        AgentFramework::from_wire(self.agent_framework.as_deref())
    }

    /// Build the payload handed to the backend: the `workOrderDetails`
    /// sub-object serialized alone when present, else the whole message.
    pub fn backend_payload(&self) -> String {
        if let Some(details) = &self.work_order_details {
            if let Ok(json) = serde_json::to_string(details) {
                return json;
            }
        }
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Extract `workOrderDetails.work_order_id`, if present and a string.
    pub fn work_order_id(&self) -> Option<&str> {
        self.work_order_details
            .as_ref()
            .and_then(|d| d.get("work_order_id"))
            .and_then(Value::as_str)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
