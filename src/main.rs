//! frame-relay daemon
//!
//! Accepts enveloped frames from agents, forwards them to the core store
//! over HTTP, and returns the store's answer in the same envelope.
//! Configuration is JSON from `--config` or the `RELAY_CONFIG` env var.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use frame_relay_daemon::{backend::HttpCore, config::Config, relay::Relay, transport};

#[derive(Parser, Debug)]
#[command(name = "frame-relay-daemon")]
#[command(about = "Relay between enveloped agent frames and an HTTP core store")]
struct Args {
    /// Path to a JSON config file (defaults to the RELAY_CONFIG env var)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Core store base URL, overriding the config
    #[arg(long)]
    core: Option<String>,

    /// Listen address, overriding the config
    #[arg(long)]
    listen: Option<String>,

    /// Frame prefix marker, overriding the config
    #[arg(long)]
    magic: Option<String>,

    /// Frame terminator marker, overriding the config
    #[arg(long)]
    magic_term: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(core) = self.core {
            config.core_url = core;
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(magic) = self.magic {
            config.magic = magic;
        }
        if let Some(magic_term) = self.magic_term {
            config.magic_term = magic_term;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
    .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        core = %config.core_url,
        listen = %config.listen,
        timeout = ?config.request_timeout_seconds,
        "Loaded configuration"
    );

    let core = HttpCore::new(&config.core_url, config.request_timeout())
        .context("Failed to create core store client")?;
    let relay = Relay::new(&config, core);

    transport::serve_tcp(&config, relay).await
}
