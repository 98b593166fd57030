//! Store capability traits, the seams the dispatcher is tested against.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Safety-check fields merged into a work order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafetyCheckRecord {
    /// The persisted report fragment.
    pub safety_check_response: String,
    /// RFC 3339 completion timestamp.
    pub safety_check_performed_at: String,
}

/// Durable mapping of connection id → metadata with expiry.
///
/// Advisory only: presence implies a previously accepted, unexpired connect
/// event; absence does not guarantee the transport actually closed. No read
/// is needed for routing — routing is per-event.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Create or refresh an entry expiring after `ttl`.
    async fn put(&self, connection_id: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove an entry. Idempotent; absence is not an error.
    async fn delete(&self, connection_id: &str) -> Result<(), StoreError>;

    /// Whether an unexpired entry exists (diagnostics and tests).
    async fn contains(&self, connection_id: &str) -> Result<bool, StoreError>;
}

/// External work-order records, keyed by a stable id.
///
/// The gateway only merges safety-check fields into rows that already exist
/// (last-writer-wins, no versioning); it never creates them.
#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    /// Merge the safety-check response and completion timestamp into an
    /// existing work order. Fails with
    /// [`StoreError::WorkOrderNotFound`] when the row does not exist.
    async fn update_safety_check(
        &self,
        work_order_id: &str,
        response: &str,
        performed_at: &str,
    ) -> Result<(), StoreError>;

    /// Read back the safety-check fields, if set.
    async fn safety_check(
        &self,
        work_order_id: &str,
    ) -> Result<Option<SafetyCheckRecord>, StoreError>;
}
