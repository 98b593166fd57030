//! Store error types.

/// Errors that can occur in the connection registry or work-order store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Could not obtain a pooled connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A safety-check update targeted a work order that does not exist.
    /// The gateway never creates work orders; the row must be there first.
    #[error("work order not found: {work_order_id}")]
    WorkOrderNotFound {
        /// The id the update was keyed by.
        work_order_id: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_order_not_found_display() {
        let err = StoreError::WorkOrderNotFound {
            work_order_id: "WO42".into(),
        };
        assert_eq!(err.to_string(), "work order not found: WO42");
    }

    #[test]
    fn sqlite_error_conversion() {
        let err = StoreError::from(rusqlite::Error::InvalidQuery);
        assert!(err.to_string().starts_with("sqlite error"));
    }
}
