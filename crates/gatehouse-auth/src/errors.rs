//! Auth error types.

/// Errors that can occur while verifying a bearer token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// JWKS endpoint request failed.
    #[error("JWKS fetch error: {0}")]
    Http(#[from] reqwest::Error),

    /// The key set endpoint returned no keys.
    #[error("no keys found in JWKS response")]
    EmptyKeySet,

    /// The token header carries no key id.
    #[error("invalid token header: missing kid")]
    MissingKeyId,

    /// No key in the set matches the token's key id.
    #[error("no matching key found for kid: {kid}")]
    NoMatchingKey {
        /// The key id the token asked for.
        kid: String,
    },

    /// The token failed decoding or validation (malformed, bad signature,
    /// wrong audience, expired).
    #[error("token verification failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
