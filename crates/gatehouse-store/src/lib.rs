//! # gatehouse-store
//!
//! Durable state for the Gatehouse gateway:
//!
//! - [`ConnectionRegistry`]: connection id → metadata with expiry. Advisory
//!   only — presence implies an accepted connect event; absence does not
//!   guarantee the transport closed.
//! - [`WorkOrderStore`]: merges safety-check results into existing work
//!   orders (last-writer-wins; rows are never created by the gateway).
//!
//! The SQLite implementation uses an `r2d2` pool with WAL pragmas and
//! embedded migrations; repositories are stateless and take `&Connection`.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod registry;
pub mod traits;
pub mod work_orders;

pub use connection::{ConnectionPool, PoolConfig, new_file, new_in_memory};
pub use errors::StoreError;
pub use migrations::run_migrations;
pub use registry::SqliteConnectionRegistry;
pub use traits::{ConnectionRegistry, SafetyCheckRecord, WorkOrderStore};
pub use work_orders::SqliteWorkOrderStore;
