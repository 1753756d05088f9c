//! Domain-specific error types for the display engine.
//!
//! All fallible operations return `Result<T, OledError>`.
//! Callers on the render path log and discard these; nothing here panics.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the display engine.
#[derive(Debug, Error)]
pub enum OledError {
    // ── Discovery Errors ─────────────────────────────────────────
    /// None of the candidate discovery files exist (device service not running).
    #[error("device service discovery file not found (searched {searched} paths)")]
    DiscoveryFileMissing { searched: usize },

    /// The discovery file exists but carries no usable `address` field.
    #[error("invalid discovery file {path}: {reason}")]
    InvalidDiscoveryFile { path: PathBuf, reason: String },

    // ── Transport Errors ─────────────────────────────────────────
    /// The HTTP layer reported an error (connect, timeout, body).
    #[error("device request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The device service answered with a non-success status.
    #[error("device service returned status {status} for {endpoint}")]
    Status { endpoint: &'static str, status: u16 },

    /// A session transition was attempted from the wrong state.
    #[error("invalid device session transition: {0}")]
    InvalidTransition(&'static str),

    // ── Ingress Errors ───────────────────────────────────────────
    /// The extension listener could not bind its loopback port.
    #[error("extension ingress bind failed on port {port}: {reason}")]
    IngressBind { port: u16, reason: String },

    /// A pushed body was not a JSON object.
    #[error("malformed extension payload: {0}")]
    MalformedPayload(String),

    // ── Media / Render Errors ────────────────────────────────────
    /// The media-session provider failed.
    #[error("media session provider error: {0}")]
    Provider(String),

    /// A renderer could not produce a frame.
    #[error("render failed: {0}")]
    Render(String),

    // ── Generic Errors ───────────────────────────────────────────
    /// The TCP/IO layer or the filesystem reported an error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for OledError {
    fn from(s: String) -> Self {
        OledError::Other(s)
    }
}

impl From<&str> for OledError {
    fn from(s: &str) -> Self {
        OledError::Other(s.to_string())
    }
}
