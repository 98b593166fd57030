//! The client-notification capability.
//!
//! Delivery is best-effort, at-most-once: implementations swallow every
//! failure (logging it), so an undeliverable frame can never fail the
//! in-flight request that produced it.

use async_trait::async_trait;

use crate::frames::FrameMessage;

/// Delivers a typed frame to a specific connection.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Wrap `message` in the outbound envelope and push it to
    /// `connection_id`. Never fails the caller.
    async fn send(&self, connection_id: &str, message: FrameMessage);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::AgentFramework;
    use std::sync::Mutex;

    /// Minimal recording implementation, as used throughout the workspace
    /// tests.
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, FrameMessage)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, connection_id: &str, message: FrameMessage) {
            self.sent
                .lock()
                .unwrap()
                .push((connection_id.to_string(), message));
        }
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let notifier = RecordingNotifier {
            sent: Mutex::new(Vec::new()),
        };
        let dyn_ref: &dyn Notifier = &notifier;
        dyn_ref
            .send("c1", FrameMessage::error("r", "x", AgentFramework::Inline))
            .await;
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "c1");
        assert_eq!(sent[0].1.frame_type(), "error");
    }
}
