//! Core store client trait and implementations.
//!
//! The core store is the service of record for agents, commands and results.
//! Handlers talk to it only through [`CoreBackend`], so the transport to the
//! store can be swapped out (and mocked in tests).

mod http;

pub use http::HttpCore;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::protocol::{ActionResult, Registration};

/// Trait for core store clients.
///
/// Each method issues exactly one request. Response status codes are not
/// interpreted; whatever body comes back is returned as-is.
#[async_trait]
pub trait CoreBackend: Send + Sync {
    /// Register an agent. Returns the store's response body verbatim.
    async fn register(&self, registration: &Registration) -> Result<String, CoreError>;

    /// Fetch the printed list of pending commands for an agent.
    async fn fetch_commands(&self, uuid: &str) -> Result<String, CoreError>;

    /// Record the result of one action. The response is discarded.
    async fn submit_result(&self, result: &ActionResult) -> Result<(), CoreError>;
}
