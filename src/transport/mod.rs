//! Transport layer for agent ↔ relay communication.
//!
//! Agents send one envelope per connection. A frame ends at the magic
//! terminator or when the agent half-closes the connection, whichever
//! comes first.

pub mod tcp;

pub use tcp::serve_tcp;

use anyhow::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_CHUNK: usize = 4096;

/// Read one frame from an agent connection.
///
/// Returns `Ok(None)` if the peer closed without sending anything. Frames
/// larger than `max_bytes` are an error.
pub async fn recv_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    terminator: &str,
    max_bytes: usize,
) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        // Only the tail can contain a terminator that was just completed.
        let search_from = buf.len().saturating_sub(terminator.len());
        buf.extend_from_slice(&chunk[..n]);
        anyhow::ensure!(
            buf.len() <= max_bytes,
            "Frame exceeds max size: {} > {max_bytes}",
            buf.len()
        );
        if contains(&buf[search_from..], terminator.as_bytes()) {
            break;
        }
    }

    if buf.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Write a reply frame and flush. Empty replies write nothing.
pub async fn send_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &str) -> Result<()> {
    if frame.is_empty() {
        return Ok(());
    }
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
