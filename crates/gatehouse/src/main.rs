//! # gatehouse
//!
//! Gateway server binary — loads configuration, wires the store, verifier,
//! and both invocation strategies together, and runs the `WebSocket` host.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gatehouse_agents::{
    BackendIdentifiers, HttpBackendClient, InlineInvoker, SupervisorInvoker,
};
use gatehouse_auth::{JwksClient, TokenVerifier};
use gatehouse_server::config::GatewayConfig;
use gatehouse_server::dispatcher::{Dispatcher, DispatcherDeps};
use gatehouse_server::{ClientNotifier, ConnectionMap, GatewayServer, ShutdownCoordinator};
use gatehouse_store::{
    PoolConfig, SqliteConnectionRegistry, SqliteWorkOrderStore, new_file, new_in_memory,
    run_migrations,
};
use tracing::{info, warn};

/// Gatehouse safety-check gateway server.
#[derive(Parser, Debug)]
#[command(name = "gatehouse", about = "Gatehouse safety-check gateway server")]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database (overrides config; in-memory if unset).
    #[arg(long)]
    db_path: Option<String>,
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    gatehouse_core::logging::init_subscriber("info");

    let mut config =
        GatewayConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db_path) = cli.db_path {
        config.store.db_path = Some(db_path);
    }

    // Durable state.
    let pool = match &config.store.db_path {
        Some(path) => {
            ensure_parent_dir(path)?;
            new_file(path, &PoolConfig::default())?
        }
        None => {
            warn!("no db_path configured, using an in-memory store");
            new_in_memory(&PoolConfig::default())?
        }
    };
    {
        let conn = pool.get()?;
        run_migrations(&conn)?;
    }
    let registry = Arc::new(SqliteConnectionRegistry::new(pool.clone()));
    let work_orders = Arc::new(SqliteWorkOrderStore::new(pool));

    // Token verification.
    let jwks_url = config
        .auth
        .jwks_url
        .clone()
        .context("auth.jwks_url is required")?;
    let audience = config
        .auth
        .audience
        .clone()
        .context("auth.audience is required")?;
    let jwks = JwksClient::new(
        jwks_url,
        Duration::from_secs(config.auth.fetch_timeout_secs),
        Duration::from_secs(config.auth.cache_max_staleness_secs),
    )?;
    let verifier = Arc::new(TokenVerifier::new(jwks, audience));

    // Invocation strategies.
    let inline_config = &config.agents.inline;
    let backend = Arc::new(HttpBackendClient::new(
        inline_config.endpoint.clone().unwrap_or_default(),
        Duration::from_secs(inline_config.connect_timeout_secs),
        Duration::from_secs(inline_config.invoke_timeout_secs),
    )?);
    let inline = Arc::new(InlineInvoker::new(
        backend,
        BackendIdentifiers {
            agent_id: inline_config.agent_id.clone(),
            agent_alias_id: inline_config.agent_alias_id.clone(),
        },
    ));
    let supervisor = Arc::new(SupervisorInvoker::new(
        config.agents.supervisor.endpoint.clone(),
        Duration::from_secs(config.agents.supervisor.invoke_timeout_secs),
    )?);

    // Host wiring.
    let connections = Arc::new(ConnectionMap::new());
    let notifier = Arc::new(ClientNotifier::new(
        connections.clone(),
        registry.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(DispatcherDeps {
        registry,
        verifier,
        work_orders,
        notifier,
        inline,
        supervisor,
        connection_ttl: Duration::from_secs(config.store.connection_ttl_secs),
    }));

    let server = GatewayServer::new(config.server.clone(), dispatcher, connections);
    let shutdown = ShutdownCoordinator::new();
    shutdown.spawn_signal_listener();

    info!(
        host = %config.server.host,
        port = config.server.port,
        "starting gatehouse"
    );
    server.run(shutdown.token()).await?;
    info!("gatehouse stopped");
    Ok(())
}
