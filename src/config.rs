//! Relay configuration.
//!
//! Loaded as JSON from a file or from the `RELAY_CONFIG` environment
//! variable, then optionally overridden from the command line. Immutable
//! once the relay starts.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::envelope::Markers;

/// Environment variable holding the JSON configuration.
pub const CONFIG_ENV: &str = "RELAY_CONFIG";

/// Top-level configuration for the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the core store (e.g., "http://127.0.0.1:5000").
    pub core_url: String,

    /// Magic string that opens every frame.
    pub magic: String,

    /// Magic string that closes every frame.
    pub magic_term: String,

    /// Address the agent listener binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Per-request timeout for core store calls. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    /// Largest frame accepted from an agent connection.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

fn default_listen() -> String {
    "0.0.0.0:8888".into()
}

const fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

impl Config {
    /// Load configuration from the `RELAY_CONFIG` environment variable.
    pub fn from_env() -> Result<Self> {
        let json = std::env::var(CONFIG_ENV)
            .with_context(|| format!("{CONFIG_ENV} not set and no --config given"))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse {CONFIG_ENV}"))
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Invalid configuration JSON")?;
        Ok(config)
    }

    /// Check the values the relay cannot run without.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.core_url.is_empty(), "core_url must not be empty");
        anyhow::ensure!(
            self.core_url.starts_with("http://") || self.core_url.starts_with("https://"),
            "core_url must start with http:// or https://, got '{}'",
            self.core_url
        );
        anyhow::ensure!(!self.magic.is_empty(), "magic must not be empty");
        anyhow::ensure!(!self.magic_term.is_empty(), "magic_term must not be empty");
        anyhow::ensure!(self.max_frame_bytes > 0, "max_frame_bytes must be positive");
        Ok(())
    }

    /// Frame markers for the envelope codec.
    pub fn markers(&self) -> Markers {
        Markers::new(self.magic.clone(), self.magic_term.clone())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }
}
