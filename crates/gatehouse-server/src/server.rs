//! `GatewayServer` — Axum HTTP + `WebSocket` host.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::connections::ConnectionMap;
use crate::dispatcher::Dispatcher;
use crate::health::{self, HealthResponse};
use crate::websocket::ws_handler;

/// Server startup/runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Bind or serve failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The event state machine.
    pub dispatcher: Arc<Dispatcher>,
    /// Live connection map (also the push mechanism).
    pub connections: Arc<ConnectionMap>,
    /// Push endpoint handed to delegating backends, reconstructed per
    /// deployment from the server's public address.
    pub push_endpoint: String,
    /// When the server started.
    pub start_time: Instant,
}

/// The gateway server.
pub struct GatewayServer {
    config: ServerConfig,
    state: AppState,
}

impl GatewayServer {
    /// Assemble the server over its dispatcher and live connection map.
    pub fn new(
        config: ServerConfig,
        dispatcher: Arc<Dispatcher>,
        connections: Arc<ConnectionMap>,
    ) -> Self {
        let push_endpoint = config.push_endpoint.clone().unwrap_or_else(|| {
            format!("http://{}:{}/push", config.host, config.port)
        });
        Self {
            config,
            state: AppState {
                dispatcher,
                connections,
                push_endpoint,
                start_time: Instant::now(),
            },
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind and serve until the token cancels.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        info!(addr = %listener.local_addr()?, "gateway listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        Ok(())
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.connections.count().await;
    Json(health::health_check(state.start_time, connections))
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

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gatehouse_agents::{AgentInvoker, InvokeOutcome, InvokeRequest};
    use gatehouse_auth::{AuthError, Claims, TokenVerify};
    use gatehouse_core::{FrameMessage, Notifier};
    use gatehouse_store::{ConnectionRegistry, SafetyCheckRecord, StoreError, WorkOrderStore};
    use tower::ServiceExt;

    use crate::dispatcher::DispatcherDeps;

    struct NullRegistry(Mutex<HashSet<String>>);

    #[async_trait]
    impl ConnectionRegistry for NullRegistry {
        async fn put(&self, connection_id: &str, _ttl: Duration) -> Result<(), StoreError> {
            let _ = self.0.lock().unwrap().insert(connection_id.to_string());
            Ok(())
        }

        async fn delete(&self, connection_id: &str) -> Result<(), StoreError> {
            let _ = self.0.lock().unwrap().remove(connection_id);
            Ok(())
        }

        async fn contains(&self, connection_id: &str) -> Result<bool, StoreError> {
            Ok(self.0.lock().unwrap().contains(connection_id))
        }
    }

    struct NullVerifier;

    #[async_trait]
    impl TokenVerify for NullVerifier {
        async fn verify(&self, _token: &str) -> Result<Claims, AuthError> {
            Ok(Claims {
                sub: None,
                email: None,
            })
        }
    }

    struct NullWorkOrders;

    #[async_trait]
    impl WorkOrderStore for NullWorkOrders {
        async fn update_safety_check(
            &self,
            _work_order_id: &str,
            _response: &str,
            _performed_at: &str,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn safety_check(
            &self,
            _work_order_id: &str,
        ) -> Result<Option<SafetyCheckRecord>, StoreError> {
            Ok(None)
        }
    }

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn send(&self, _connection_id: &str, _message: FrameMessage) {}
    }

    struct NullInvoker;

    #[async_trait]
    impl AgentInvoker for NullInvoker {
        async fn invoke(
            &self,
            _request: &InvokeRequest,
            _notifier: &dyn Notifier,
        ) -> InvokeOutcome {
            InvokeOutcome::completed(String::new())
        }
    }

    fn make_server(config: ServerConfig) -> GatewayServer {
        let dispatcher = Arc::new(Dispatcher::new(DispatcherDeps {
            registry: Arc::new(NullRegistry(Mutex::new(HashSet::new()))),
            verifier: Arc::new(NullVerifier),
            work_orders: Arc::new(NullWorkOrders),
            notifier: Arc::new(NullNotifier),
            inline: Arc::new(NullInvoker),
            supervisor: Arc::new(NullInvoker),
            connection_ttl: Duration::from_secs(600),
        }));
        GatewayServer::new(config, dispatcher, Arc::new(ConnectionMap::new()))
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let server = make_server(ServerConfig::default());
        let app = server.router();

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ws_route_requires_upgrade() {
        let server = make_server(ServerConfig::default());
        let app = server.router();

        // A plain GET without the upgrade headers is rejected.
        let req = Request::builder().uri("/ws").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_ne!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn push_endpoint_derived_from_address() {
        let server = make_server(ServerConfig {
            host: "10.0.0.5".into(),
            port: 9000,
            push_endpoint: None,
        });
        assert_eq!(server.state.push_endpoint, "http://10.0.0.5:9000/push");
    }

    #[test]
    fn push_endpoint_override_wins() {
        let server = make_server(ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            push_endpoint: Some("https://gateway.example.com/push".into()),
        });
        assert_eq!(
            server.state.push_endpoint,
            "https://gateway.example.com/push"
        );
    }
}
