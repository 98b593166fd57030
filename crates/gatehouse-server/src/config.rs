//! Gateway configuration.
//!
//! Loading flow:
//! 1. Start with compiled [`GatewayConfig::default()`]
//! 2. If a JSON config file exists, deep-merge user values over defaults
//! 3. Apply `GATEHOUSE_*` environment overrides (highest priority)
//!
//! Deep merge rules: objects merge recursively, arrays and primitives are
//! replaced, nulls in the source are skipped.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Configuration load errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file or merged value could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// HTTP/`WebSocket` host settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `8787`; `0` auto-assigns).
    pub port: u16,
    /// Public push endpoint handed to delegating backends. Defaults to
    /// `http://{host}:{port}/push` when unset.
    pub push_endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            push_endpoint: None,
        }
    }
}

/// Token verification settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWKS endpoint of the identity-token issuer.
    pub jwks_url: Option<String>,
    /// Expected audience claim.
    pub audience: Option<String>,
    /// Timeout for each key-set fetch (default 15 s).
    pub fetch_timeout_secs: u64,
    /// How long a fetched key set may be served from cache (default 300 s).
    /// Must stay well inside the issuer's key rotation window.
    pub cache_max_staleness_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks_url: None,
            audience: None,
            fetch_timeout_secs: 15,
            cache_max_staleness_secs: 300,
        }
    }
}

/// Streaming backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineAgentConfig {
    /// Invocation endpoint.
    pub endpoint: Option<String>,
    /// Deployed agent id.
    pub agent_id: Option<String>,
    /// Deployed agent alias id.
    pub agent_alias_id: Option<String>,
    /// Connection establishment timeout (default 10 s).
    pub connect_timeout_secs: u64,
    /// Whole-invocation timeout including the streamed body (default 80 s).
    pub invoke_timeout_secs: u64,
}

impl Default for InlineAgentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            agent_id: None,
            agent_alias_id: None,
            connect_timeout_secs: 10,
            invoke_timeout_secs: 80,
        }
    }
}

/// Delegating backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorAgentConfig {
    /// Supervisor service endpoint.
    pub endpoint: Option<String>,
    /// Whole-call timeout (default 90 s).
    pub invoke_timeout_secs: u64,
}

impl Default for SupervisorAgentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            invoke_timeout_secs: 90,
        }
    }
}

/// Both backend variants.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Streaming variant.
    pub inline: InlineAgentConfig,
    /// Delegating variant.
    pub supervisor: SupervisorAgentConfig,
}

/// Durable state settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `SQLite` database path; unset means in-memory (ephemeral).
    pub db_path: Option<String>,
    /// Connection registry entry lifetime in seconds (default 600 — ten
    /// minutes, the session lifetime the reference deployment enforced).
    pub connection_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            connection_ttl_secs: 600,
        }
    }
}

/// Top-level gateway configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP/`WebSocket` host.
    pub server: ServerConfig,
    /// Token verification.
    pub auth: AuthConfig,
    /// Backend variants.
    pub agents: AgentsConfig,
    /// Durable state.
    pub store: StoreConfig,
}

impl GatewayConfig {
    /// Load configuration: defaults, deep-merged file, env overrides.
    ///
    /// A missing file is fine (defaults apply); invalid JSON is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = serde_json::to_value(Self::default())?;

        let merged = match path {
            Some(path) if path.exists() => {
                debug!(?path, "loading gateway config from file");
                let content = std::fs::read_to_string(path)?;
                let user: Value = serde_json::from_str(&content)?;
                deep_merge(defaults, user)
            }
            _ => defaults,
        };

        let mut config: Self = serde_json::from_value(merged)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("GATEHOUSE_HOST") {
            self.server.host = value;
        }
        if let Ok(value) = std::env::var("GATEHOUSE_PORT") {
            if let Ok(port) = value.parse() {
                self.server.port = port;
            }
        }
        if let Ok(value) = std::env::var("GATEHOUSE_PUSH_ENDPOINT") {
            self.server.push_endpoint = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_JWKS_URL") {
            self.auth.jwks_url = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_AUDIENCE") {
            self.auth.audience = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_INLINE_ENDPOINT") {
            self.agents.inline.endpoint = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_INLINE_AGENT_ID") {
            self.agents.inline.agent_id = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_INLINE_AGENT_ALIAS_ID") {
            self.agents.inline.agent_alias_id = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_SUPERVISOR_ENDPOINT") {
            self.agents.supervisor.endpoint = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_DB_PATH") {
            self.store.db_path = Some(value);
        }
        if let Ok(value) = std::env::var("GATEHOUSE_CONNECTION_TTL_SECS") {
            if let Ok(ttl) = value.parse() {
                self.store.connection_ttl_secs = ttl;
            }
        }
    }
}

/// Recursive deep merge of two JSON values.
fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                if source_value.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_value) => deep_merge(target_value, source_value),
                    None => source_value,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
