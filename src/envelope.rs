//! Envelope codec for agent frames.
//!
//! Frames are `<prefix><base64(body)><terminator>`. Both markers are fixed
//! for the lifetime of the process and come from [`Markers`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

/// Magic prefix and terminator that bracket every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub prefix: String,
    pub terminator: String,
}

impl Markers {
    pub fn new(prefix: impl Into<String>, terminator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            terminator: terminator.into(),
        }
    }
}

/// Strip the markers from a frame and base64-decode the remainder.
///
/// Every occurrence of either marker is removed, not only the ones at the
/// edges. Invalid base64 decodes to an empty body.
pub fn decode(frame: &str, markers: &Markers) -> String {
    let mut encoded = strip_all(frame, &markers.prefix);
    encoded = strip_all(&encoded, &markers.terminator);

    match STANDARD.decode(encoded.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(error = %e, frame_len = frame.len(), "Discarding undecodable frame");
            String::new()
        }
    }
}

/// Base64-encode a body and wrap it in the markers.
pub fn encode(body: &str, markers: &Markers) -> String {
    let encoded = STANDARD.encode(body.as_bytes());
    let mut frame =
        String::with_capacity(markers.prefix.len() + encoded.len() + markers.terminator.len());
    frame.push_str(&markers.prefix);
    frame.push_str(&encoded);
    frame.push_str(&markers.terminator);
    frame
}

fn strip_all(text: &str, marker: &str) -> String {
    if marker.is_empty() {
        text.to_string()
    } else {
        text.replace(marker, "")
    }
}
