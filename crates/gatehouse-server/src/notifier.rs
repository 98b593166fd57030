//! Best-effort frame delivery.
//!
//! The notifier serializes the outbound envelope and pushes it through the
//! connection-push seam. A `Gone` signal means the connection no longer
//! exists: the stale registry entry is removed and the error swallowed. Any
//! other delivery error is logged and swallowed identically — delivery
//! failure never propagates into the in-flight request. At-most-once, no
//! retries, no buffering.

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_core::{Frame, FrameMessage, Notifier};
use gatehouse_store::ConnectionRegistry;
use tracing::{error, warn};

/// Delivery failure surfaced by the push mechanism.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The connection no longer exists.
    #[error("connection gone")]
    Gone,
    /// Any other delivery failure.
    #[error("delivery failed: {message}")]
    Other {
        /// Failure description.
        message: String,
    },
}

/// The connection-push mechanism: deliver one serialized frame.
#[async_trait]
pub trait ConnectionPush: Send + Sync {
    /// Push `text` to `connection_id`.
    async fn push(&self, connection_id: &str, text: &str) -> Result<(), PushError>;
}

/// [`Notifier`] implementation over a push mechanism and the registry.
pub struct ClientNotifier {
    push: Arc<dyn ConnectionPush>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl ClientNotifier {
    /// Create a notifier.
    pub fn new(push: Arc<dyn ConnectionPush>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { push, registry }
    }
}

#[async_trait]
impl Notifier for ClientNotifier {
    async fn send(&self, connection_id: &str, message: FrameMessage) {
        let frame = Frame::new(message, connection_id);
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                error!(connection_id, error = %e, "failed to serialize frame");
                return;
            }
        };
        match self.push.push(connection_id, &text).await {
            Ok(()) => {}
            Err(PushError::Gone) => {
                warn!(connection_id, "connection gone, removing stale registry entry");
                if let Err(e) = self.registry.delete(connection_id).await {
                    error!(connection_id, error = %e, "failed to delete stale connection");
                }
            }
            Err(e) => {
                error!(connection_id, error = %e, "failed to deliver frame");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use gatehouse_core::AgentFramework;
    use gatehouse_store::StoreError;

    struct FakeRegistry {
        entries: Mutex<HashSet<String>>,
    }

    impl FakeRegistry {
        fn with(ids: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(ids.iter().map(ToString::to_string).collect()),
            })
        }
    }

    #[async_trait]
    impl ConnectionRegistry for FakeRegistry {
        async fn put(&self, connection_id: &str, _ttl: Duration) -> Result<(), StoreError> {
            let _ = self
                .entries
                .lock()
                .unwrap()
                .insert(connection_id.to_string());
            Ok(())
        }

        async fn delete(&self, connection_id: &str) -> Result<(), StoreError> {
            let _ = self.entries.lock().unwrap().remove(connection_id);
            Ok(())
        }

        async fn contains(&self, connection_id: &str) -> Result<bool, StoreError> {
            Ok(self.entries.lock().unwrap().contains(connection_id))
        }
    }

    struct RecordingPush {
        delivered: Mutex<Vec<(String, String)>>,
        result: fn() -> Result<(), PushError>,
    }

    impl RecordingPush {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                delivered: Mutex::new(Vec::new()),
                result: || Ok(()),
            })
        }

        fn gone() -> Arc<Self> {
            Arc::new(Self {
                delivered: Mutex::new(Vec::new()),
                result: || Err(PushError::Gone),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                delivered: Mutex::new(Vec::new()),
                result: || {
                    Err(PushError::Other {
                        message: "socket write failed".into(),
                    })
                },
            })
        }
    }

    #[async_trait]
    impl ConnectionPush for RecordingPush {
        async fn push(&self, connection_id: &str, text: &str) -> Result<(), PushError> {
            self.delivered
                .lock()
                .unwrap()
                .push((connection_id.to_string(), text.to_string()));
            (self.result)()
        }
    }

    fn error_message() -> FrameMessage {
        FrameMessage::error("r1", "boom", AgentFramework::Inline)
    }

    #[tokio::test]
    async fn delivers_enveloped_frame() {
        let push = RecordingPush::ok();
        let registry = FakeRegistry::with(&["c1"]);
        let notifier = ClientNotifier::new(push.clone(), registry);

        notifier.send("c1", error_message()).await;

        let delivered = push.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "c1");
        let frame: serde_json::Value = serde_json::from_str(&delivered[0].1).unwrap();
        assert_eq!(frame["sender"], "c1");
        assert_eq!(frame["message"]["type"], "error");
        assert!(frame["timestamp"].is_string());
    }

    #[tokio::test]
    async fn gone_removes_registry_entry() {
        let push = RecordingPush::gone();
        let registry = FakeRegistry::with(&["c1"]);
        let notifier = ClientNotifier::new(push, registry.clone());

        notifier.send("c1", error_message()).await;
        assert!(!registry.contains("c1").await.unwrap());
    }

    #[tokio::test]
    async fn other_failure_keeps_registry_entry() {
        let push = RecordingPush::failing();
        let registry = FakeRegistry::with(&["c1"]);
        let notifier = ClientNotifier::new(push, registry.clone());

        notifier.send("c1", error_message()).await;
        assert!(registry.contains("c1").await.unwrap());
    }

    #[tokio::test]
    async fn failures_never_propagate() {
        // Both failure shapes return normally.
        for push in [RecordingPush::gone(), RecordingPush::failing()] {
            let notifier = ClientNotifier::new(push, FakeRegistry::with(&[]));
            notifier.send("c1", error_message()).await;
        }
    }
}
