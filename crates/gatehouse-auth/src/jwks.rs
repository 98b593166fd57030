//! JWKS fetching with a time-bounded cache.
//!
//! The issuer publishes its signing keys at a well-known endpoint. Fetching
//! on every message is an availability risk, so the set is cached for a
//! bounded staleness window; a verifier that misses a `kid` invalidates the
//! cache and re-fetches once, so key rotation is picked up immediately.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use crate::errors::AuthError;

/// One RSA key from the published set.
#[derive(Clone, Debug, Deserialize)]
pub struct Jwk {
    /// Key id, matched against the token header.
    #[serde(default)]
    pub kid: Option<String>,
    /// Key type (`"RSA"` for every key this gateway can use).
    pub kty: String,
    /// RSA modulus, base64url.
    pub n: String,
    /// RSA public exponent, base64url.
    pub e: String,
}

#[derive(Debug, Deserialize)]
struct KeySet {
    #[serde(default)]
    keys: Vec<Jwk>,
}

struct CachedKeys {
    keys: Vec<Jwk>,
    fetched_at: Instant,
}

/// Fetches and caches the key set published at a JWKS endpoint.
pub struct JwksClient {
    http: reqwest::Client,
    url: String,
    max_staleness: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksClient {
    /// Create a client for the given endpoint.
    ///
    /// `fetch_timeout` bounds each network call; `max_staleness` bounds how
    /// long a fetched set is served from cache.
    pub fn new(
        url: impl Into<String>,
        fetch_timeout: Duration,
        max_staleness: Duration,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            max_staleness,
            cache: RwLock::new(None),
        })
    }

    /// Return the key set, serving from cache while it is fresh.
    pub async fn keys(&self) -> Result<Vec<Jwk>, AuthError> {
        if let Some(keys) = self.fresh_cached() {
            return Ok(keys);
        }
        self.refresh().await
    }

    /// Drop any cached set and fetch the endpoint again.
    pub async fn refresh(&self) -> Result<Vec<Jwk>, AuthError> {
        let response = self.http.get(&self.url).send().await?.error_for_status()?;
        let set: KeySet = response.json().await?;
        if set.keys.is_empty() {
            return Err(AuthError::EmptyKeySet);
        }
        debug!(url = %self.url, count = set.keys.len(), "fetched JWKS");
        *self.cache.write() = Some(CachedKeys {
            keys: set.keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(set.keys)
    }

    fn fresh_cached(&self) -> Option<Vec<Jwk>> {
        let guard = self.cache.read();
        guard
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.max_staleness)
            .map(|c| c.keys.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
