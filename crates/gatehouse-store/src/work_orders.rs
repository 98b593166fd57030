//! `SQLite`-backed work-order store.
//!
//! Work orders are created by the upstream order-management system; the
//! gateway only merges safety-check fields into existing rows.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};

use crate::connection::ConnectionPool;
use crate::errors::StoreError;
use crate::traits::{SafetyCheckRecord, WorkOrderStore};

/// Stateless row operations for the `work_orders` table.
pub struct WorkOrderRepo;

impl WorkOrderRepo {
    /// Seed a work order row. The gateway never calls this; it exists for
    /// the other owner of the table (order management) and for tests.
    pub fn insert(
        conn: &Connection,
        work_order_id: &str,
        details: Option<&str>,
    ) -> Result<(), StoreError> {
        let _ = conn.execute(
            "INSERT INTO work_orders (work_order_id, details) VALUES (?1, ?2)",
            params![work_order_id, details],
        )?;
        Ok(())
    }

    /// Merge safety-check fields into an existing row. Returns whether a
    /// row was updated (last write wins; no versioning).
    pub fn update_safety_check(
        conn: &Connection,
        work_order_id: &str,
        response: &str,
        performed_at: &str,
    ) -> Result<bool, StoreError> {
        let changed = conn.execute(
            "UPDATE work_orders
             SET safety_check_response = ?1, safety_check_performed_at = ?2
             WHERE work_order_id = ?3",
            params![response, performed_at, work_order_id],
        )?;
        Ok(changed > 0)
    }

    /// Read the safety-check fields for a work order, if both are set.
    pub fn safety_check(
        conn: &Connection,
        work_order_id: &str,
    ) -> Result<Option<SafetyCheckRecord>, StoreError> {
        let record = conn
            .query_row(
                "SELECT safety_check_response, safety_check_performed_at
                 FROM work_orders WHERE work_order_id = ?1",
                params![work_order_id],
                |row| {
                    let response: Option<String> = row.get(0)?;
                    let performed_at: Option<String> = row.get(1)?;
                    Ok(response.zip(performed_at))
                },
            )
            .optional()?
            .flatten()
            .map(
                |(safety_check_response, safety_check_performed_at)| SafetyCheckRecord {
                    safety_check_response,
                    safety_check_performed_at,
                },
            );
        Ok(record)
    }
}

/// Work-order store implementation over a pooled `SQLite` database.
pub struct SqliteWorkOrderStore {
    pool: ConnectionPool,
}

impl SqliteWorkOrderStore {
    /// Wrap a pool whose database has been migrated.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (seeding, diagnostics).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

#[async_trait]
impl WorkOrderStore for SqliteWorkOrderStore {
    async fn update_safety_check(
        &self,
        work_order_id: &str,
        response: &str,
        performed_at: &str,
    ) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        let updated =
            WorkOrderRepo::update_safety_check(&conn, work_order_id, response, performed_at)?;
        if updated {
            Ok(())
        } else {
            Err(StoreError::WorkOrderNotFound {
                work_order_id: work_order_id.to_string(),
            })
        }
    }

    async fn safety_check(
        &self,
        work_order_id: &str,
    ) -> Result<Option<SafetyCheckRecord>, StoreError> {
        let conn = self.pool.get()?;
        WorkOrderRepo::safety_check(&conn, work_order_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
