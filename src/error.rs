//! Errors raised while talking to the core store.

use thiserror::Error;

/// Failure of a single core store request.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The request could not be completed (connect, send, or timeout).
    #[error("Failed to reach core store at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}
