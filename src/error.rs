//! Error types for picoco.

use std::io;
use thiserror::Error;

/// Result type alias for picoco operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in picoco operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base64 body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Neither image data nor an image URL was supplied.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Session missing or expired; both read the same.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Payload exceeds the relay's per-entry size limit.
    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Relay store is full of live entries.
    #[error("Relay store at capacity ({0} entries)")]
    Capacity(usize),

    /// Remote service answered with a failure or could not be reached.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Host runtime pushed a message of an unrecognized shape.
    #[error("Malformed host message: {0}")]
    MalformedHostMessage(String),

    /// Cache write rejected for lack of space.
    #[error("Storage quota exceeded: {0}")]
    StorageQuotaExceeded(String),

    /// No host bridge attached to request a capture.
    #[error("Host bridge unavailable")]
    BridgeUnavailable,

    /// Invalid state encountered.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// HTTP server could not start.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
