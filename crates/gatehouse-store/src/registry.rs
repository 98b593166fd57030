//! `SQLite`-backed connection registry.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::connection::ConnectionPool;
use crate::errors::StoreError;
use crate::traits::ConnectionRegistry;

/// Stateless row operations for the `connections` table.
pub struct ConnectionRepo;

impl ConnectionRepo {
    /// Insert or refresh a connection row.
    pub fn put(conn: &Connection, connection_id: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Utc::now();
        let expires_at = now
            .timestamp()
            .saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
        let _ = conn.execute(
            "INSERT INTO connections (connection_id, created_at, expires_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(connection_id) DO UPDATE SET expires_at = excluded.expires_at",
            params![connection_id, now.to_rfc3339(), expires_at],
        )?;
        Ok(())
    }

    /// Delete a connection row. Returns whether a row existed.
    pub fn delete(conn: &Connection, connection_id: &str) -> Result<bool, StoreError> {
        let changed = conn.execute(
            "DELETE FROM connections WHERE connection_id = ?1",
            params![connection_id],
        )?;
        Ok(changed > 0)
    }

    /// Whether an unexpired row exists.
    pub fn contains(conn: &Connection, connection_id: &str) -> Result<bool, StoreError> {
        let now = Utc::now().timestamp();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM connections WHERE connection_id = ?1 AND expires_at > ?2",
            params![connection_id, now],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Purge rows whose expiry has passed. Returns the number removed.
    pub fn purge_expired(conn: &Connection) -> Result<usize, StoreError> {
        let now = Utc::now().timestamp();
        let removed = conn.execute(
            "DELETE FROM connections WHERE expires_at <= ?1",
            params![now],
        )?;
        Ok(removed)
    }
}

/// Registry implementation over a pooled `SQLite` database.
pub struct SqliteConnectionRegistry {
    pool: ConnectionPool,
}

impl SqliteConnectionRegistry {
    /// Wrap a pool whose database has been migrated.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRegistry for SqliteConnectionRegistry {
    async fn put(&self, connection_id: &str, ttl: Duration) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        let purged = ConnectionRepo::purge_expired(&conn)?;
        if purged > 0 {
            debug!(purged, "purged expired connection entries");
        }
        ConnectionRepo::put(&conn, connection_id, ttl)
    }

    async fn delete(&self, connection_id: &str) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        let _ = ConnectionRepo::delete(&conn, connection_id)?;
        Ok(())
    }

    async fn contains(&self, connection_id: &str) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        ConnectionRepo::contains(&conn, connection_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
