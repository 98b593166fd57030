//! Live `WebSocket` connection map.
//!
//! Maps connection id → the sender feeding that connection's writer task.
//! This is the in-process half of connection state; the durable half lives
//! in the registry. Implements [`ConnectionPush`]: an absent entry or a
//! closed channel is the `Gone` signal.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::notifier::{ConnectionPush, PushError};

/// Size of each connection's outbound channel. A slower consumer than this
/// loses frames (best-effort delivery, no buffering beyond the channel).
pub const OUTBOUND_CHANNEL_SIZE: usize = 64;

/// Connected clients indexed by connection id.
pub struct ConnectionMap {
    connections: RwLock<HashMap<String, mpsc::Sender<String>>>,
}

impl ConnectionMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection's outbound sender.
    pub async fn add(&self, connection_id: &str, tx: mpsc::Sender<String>) {
        let mut connections = self.connections.write().await;
        let _ = connections.insert(connection_id.to_string(), tx);
        debug!(connection_id, "registered live connection");
    }

    /// Remove a connection.
    pub async fn remove(&self, connection_id: &str) {
        let mut connections = self.connections.write().await;
        let _ = connections.remove(connection_id);
        debug!(connection_id, "removed live connection");
    }

    /// Number of live connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionMap {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionPush for ConnectionMap {
    async fn push(&self, connection_id: &str, text: &str) -> Result<(), PushError> {
        let tx = {
            let connections = self.connections.read().await;
            connections.get(connection_id).cloned()
        };
        let Some(tx) = tx else {
            return Err(PushError::Gone);
        };
        match tx.try_send(text.to_string()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PushError::Gone),
            Err(mpsc::error::TrySendError::Full(_)) => Err(PushError::Other {
                message: "outbound channel full".into(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_delivers_to_registered_connection() {
        let map = ConnectionMap::new();
        let (tx, mut rx) = mpsc::channel(4);
        map.add("c1", tx).await;

        map.push("c1", "hello").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn push_to_unknown_connection_is_gone() {
        let map = ConnectionMap::new();
        assert!(matches!(
            map.push("ghost", "hello").await.unwrap_err(),
            PushError::Gone
        ));
    }

    #[tokio::test]
    async fn push_to_closed_channel_is_gone() {
        let map = ConnectionMap::new();
        let (tx, rx) = mpsc::channel(4);
        map.add("c1", tx).await;
        drop(rx);

        assert!(matches!(
            map.push("c1", "hello").await.unwrap_err(),
            PushError::Gone
        ));
    }

    #[tokio::test]
    async fn push_to_full_channel_is_other() {
        let map = ConnectionMap::new();
        let (tx, _rx) = mpsc::channel(1);
        map.add("c1", tx).await;

        map.push("c1", "first").await.unwrap();
        assert!(matches!(
            map.push("c1", "second").await.unwrap_err(),
            PushError::Other { .. }
        ));
    }

    #[tokio::test]
    async fn remove_makes_connection_gone() {
        let map = ConnectionMap::new();
        let (tx, _rx) = mpsc::channel(4);
        map.add("c1", tx).await;
        assert_eq!(map.count().await, 1);

        map.remove("c1").await;
        assert_eq!(map.count().await, 0);
        assert!(matches!(
            map.push("c1", "hello").await.unwrap_err(),
            PushError::Gone
        ));
    }

    #[tokio::test]
    async fn add_replaces_existing_sender() {
        let map = ConnectionMap::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        map.add("c1", tx1).await;
        map.add("c1", tx2).await;

        map.push("c1", "to-second").await.unwrap();
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.recv().await.unwrap(), "to-second");
    }
}
