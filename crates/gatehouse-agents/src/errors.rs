//! Agent invocation error types.
//!
//! These never cross the dispatcher boundary as errors: every failure is
//! rendered into human-readable result text and a terminal `error` frame,
//! so the client always sees an outcome.

/// Errors that can occur while invoking an agent backend.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// HTTP request to the backend failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend response could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned an error status or an error payload.
    #[error("backend error ({status}): {message}")]
    Api {
        /// HTTP status code (0 when the error came from the payload).
        status: u16,
        /// Error description.
        message: String,
    },

    /// The streamed response broke mid-iteration.
    #[error("stream error: {message}")]
    Stream {
        /// Error description.
        message: String,
    },

    /// The variant is missing required configuration.
    #[error("{0} not configured")]
    NotConfigured(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
