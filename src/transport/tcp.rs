//! TCP listener for agent connections.
//!
//! One task per connection: read a frame, run it through the relay, write
//! the reply, close.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::{recv_frame, send_frame};
use crate::backend::CoreBackend;
use crate::config::Config;
use crate::relay::Relay;

/// Bind `config.listen` and serve agents until the process exits.
pub async fn serve_tcp<B: CoreBackend + 'static>(config: &Config, relay: Relay<B>) -> Result<()> {
    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    info!(addr = %listener.local_addr()?, "Listening for agents");
    serve_listener(listener, relay, config.max_frame_bytes).await
}

/// Accept loop over an already-bound listener.
pub async fn serve_listener<B: CoreBackend + 'static>(
    listener: TcpListener,
    relay: Relay<B>,
    max_frame_bytes: usize,
) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                continue;
            }
        };

        let relay = relay.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, &relay, max_frame_bytes).await {
                warn!(peer = %peer, error = %e, "Connection failed");
            }
        });
    }
}

async fn handle_connection<B: CoreBackend>(
    mut stream: TcpStream,
    peer: SocketAddr,
    relay: &Relay<B>,
    max_frame_bytes: usize,
) -> Result<()> {
    let terminator = relay.markers().terminator.clone();
    let Some(frame) = recv_frame(&mut stream, &terminator, max_frame_bytes)
        .await
        .context("Failed to read frame")?
    else {
        debug!(peer = %peer, "Peer closed without sending a frame");
        return Ok(());
    };

    debug!(peer = %peer, frame_len = frame.len(), "Received frame");
    let reply = relay.handle_payload(&frame).await;
    send_frame(&mut stream, &reply)
        .await
        .context("Failed to write reply")?;
    Ok(())
}
