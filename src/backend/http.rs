//! HTTP+JSON core store client.
//!
//! Every call is a POST with a JSON body to `<core_url><endpoint>`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::CoreBackend;
use crate::error::CoreError;
use crate::protocol::{ActionResult, CommandQuery, Registration};

const REGISTER_PATH: &str = "/register/bot";
const COMMANDS_PATH: &str = "/get/command";
const RESULT_PATH: &str = "/add/actionresult";

/// Core store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCore {
    client: Client,
    /// Base URL without a trailing slash (e.g., "http://127.0.0.1:5000").
    base_url: String,
}

impl HttpCore {
    /// Create a client for the store at `base_url`.
    ///
    /// With `timeout` unset, requests wait for the store indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, CoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(CoreError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST `body` as JSON and return the response text.
    ///
    /// A body that fails to read mid-stream is treated as empty.
    async fn post_json<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, CoreError> {
        let url = self.url(path);
        let payload = serde_json::to_vec(body)?;

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| CoreError::Unreachable {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_else(|e| {
            warn!(url = %url, error = %e, "Failed to read core store response body");
            String::new()
        });

        debug!(url = %url, status = %status, body_len = text.len(), "Core store responded");
        Ok(text)
    }
}

#[async_trait]
impl CoreBackend for HttpCore {
    #[instrument(skip(self, registration), fields(uuid = %registration.uuid))]
    async fn register(&self, registration: &Registration) -> Result<String, CoreError> {
        self.post_json(REGISTER_PATH, registration).await
    }

    #[instrument(skip(self))]
    async fn fetch_commands(&self, uuid: &str) -> Result<String, CoreError> {
        self.post_json(COMMANDS_PATH, &CommandQuery { uuid }).await
    }

    #[instrument(skip(self, result), fields(actionid = %result.actionid))]
    async fn submit_result(&self, result: &ActionResult) -> Result<(), CoreError> {
        self.post_json(RESULT_PATH, result).await.map(drop)
    }
}
