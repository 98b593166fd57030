//! # gatehouse-server
//!
//! The gateway's top half:
//!
//! - [`dispatcher::Dispatcher`]: the per-event state machine — route
//!   lifecycle and message events, authenticate, invoke a backend,
//!   normalize, persist, notify — with failure containment at the boundary
//! - [`notifier::ClientNotifier`]: best-effort frame delivery with stale
//!   connection cleanup
//! - Axum HTTP + `WebSocket` host: `/health`, `/ws`, per-connection writer
//!   tasks, one task per inbound message
//! - Config loading (defaults → JSON file deep-merge → env overrides)
//! - Graceful shutdown via `CancellationToken` + `tokio::signal`

#![deny(unsafe_code)]

pub mod config;
pub mod connections;
pub mod dispatcher;
pub mod health;
pub mod notifier;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::GatewayConfig;
pub use connections::ConnectionMap;
pub use dispatcher::{Dispatcher, DispatcherDeps, EventResponse, TransportEvent};
pub use notifier::{ClientNotifier, ConnectionPush, PushError};
pub use server::GatewayServer;
pub use shutdown::ShutdownCoordinator;
