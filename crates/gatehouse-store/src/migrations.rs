//! Embedded schema migrations, tracked via `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::info;

use crate::errors::StoreError;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

const MIGRATION_V1: &str = "
CREATE TABLE IF NOT EXISTS connections (
    connection_id TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    expires_at    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_connections_expires_at ON connections(expires_at);

CREATE TABLE IF NOT EXISTS work_orders (
    work_order_id              TEXT PRIMARY KEY,
    details                    TEXT,
    safety_check_response      TEXT,
    safety_check_performed_at  TEXT
);
";

/// Run any pending migrations on `conn`.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }
    if version < 1 {
        conn.execute_batch(MIGRATION_V1)?;
    }
    conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    info!(from = version, to = SCHEMA_VERSION, "ran store migrations");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{PoolConfig, new_in_memory};

    #[test]
    fn migrations_create_tables() {
        let pool = new_in_memory(&PoolConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('connections', 'work_orders')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn migrations_are_idempotent() {
        let pool = new_in_memory(&PoolConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let version: i32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
