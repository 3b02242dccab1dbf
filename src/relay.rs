//! Frame dispatcher.
//!
//! Decodes an agent frame, routes it by mode to a handler, and encodes the
//! handler's reply in the same envelope.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::CoreBackend;
use crate::config::Config;
use crate::envelope::{self, Markers};
use crate::handlers;
use crate::protocol::{Mode, RequestFrame};

/// Stateless relay between agents and the core store.
///
/// Holds only read-only state, so clones can serve frames concurrently.
pub struct Relay<B> {
    markers: Arc<Markers>,
    backend: Arc<B>,
}

impl<B> Clone for Relay<B> {
    fn clone(&self) -> Self {
        Self {
            markers: Arc::clone(&self.markers),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: CoreBackend> Relay<B> {
    /// Create a relay from the configured markers and a core store client.
    pub fn new(config: &Config, backend: B) -> Self {
        Self::with_markers(config.markers(), backend)
    }

    pub fn with_markers(markers: Markers, backend: B) -> Self {
        Self {
            markers: Arc::new(markers),
            backend: Arc::new(backend),
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handle one raw frame and return the encoded reply.
    ///
    /// Frames that do not decode to three fields, or that carry an unknown
    /// mode, produce an empty string rather than an encoded reply.
    pub async fn handle_payload(&self, frame: &str) -> String {
        let body = envelope::decode(frame, &self.markers);
        debug!(body = %body, "Decoded payload");

        let Some(request) = RequestFrame::parse(&body) else {
            warn!(body_len = body.len(), "Dropping frame with fewer than three fields");
            return String::new();
        };

        let Some(mode) = Mode::from_tag(request.mode_tag) else {
            debug!(mode = %request.mode_tag, "Dropping frame with unknown mode");
            return String::new();
        };

        let reply = self.dispatch(mode, &request).await;
        envelope::encode(&reply, &self.markers)
    }

    /// Run the handler for `mode` and return its plain reply body.
    pub async fn dispatch(&self, mode: Mode, request: &RequestFrame<'_>) -> String {
        debug!(mode = mode.tag(), agent_id = %request.agent_id, "Dispatching");
        let backend = self.backend.as_ref();
        match mode {
            Mode::Register => handlers::register(backend, request.data).await,
            Mode::FetchCommands => handlers::fetch_commands(backend, request.data).await,
            Mode::SubmitResult => {
                handlers::submit_results(backend, request.agent_id, request.data).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DONE, NO_COMMANDS};
    use crate::testing::{Call, MockBackend};

    fn relay(backend: MockBackend) -> Relay<MockBackend> {
        Relay::with_markers(Markers::new("MZX", "QQT"), backend)
    }

    fn frame(relay: &Relay<MockBackend>, body: &str) -> String {
        envelope::encode(body, relay.markers())
    }

    fn reply(relay: &Relay<MockBackend>, out: &str) -> String {
        envelope::decode(out, relay.markers())
    }

    #[tokio::test]
    async fn register_mode_calls_register_once() {
        let relay = relay(MockBackend::replying("welcome"));
        let out = relay
            .handle_payload(&frame(&relay, "C||abc||abc||60||10||host1"))
            .await;

        assert_eq!(reply(&relay, &out), "welcome");
        assert!(out.starts_with("MZX") && out.ends_with("QQT"));
        let calls = relay.backend().calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Register(r) if r.hostname == "host1"));
    }

    #[tokio::test]
    async fn fetch_mode_uses_data_as_uuid() {
        let relay = relay(MockBackend::replying("[]"));
        let out = relay.handle_payload(&frame(&relay, "D||abc||xyz")).await;

        assert_eq!(reply(&relay, &out), NO_COMMANDS);
        assert_eq!(relay.backend().calls(), vec![Call::FetchCommands("xyz".into())]);
    }

    #[tokio::test]
    async fn submit_mode_acks() {
        let relay = relay(MockBackend::replying(""));
        let out = relay.handle_payload(&frame(&relay, "E||abc||None")).await;
        assert_eq!(reply(&relay, &out), DONE);
        assert!(relay.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_mode_is_dropped() {
        let relay = relay(MockBackend::replying("x"));
        let out = relay.handle_payload(&frame(&relay, "Z||abc||data")).await;
        assert_eq!(out, "");
        assert_eq!(reply(&relay, &out), "");
        assert!(relay.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn short_body_is_dropped() {
        let relay = relay(MockBackend::replying("x"));
        assert_eq!(relay.handle_payload(&frame(&relay, "D||abc")).await, "");
        assert_eq!(relay.handle_payload("MZX%%%QQT").await, "");
        assert!(relay.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn clones_share_backend() {
        let relay = relay(MockBackend::replying("[]"));
        let other = relay.clone();
        other.handle_payload(&frame(&other, "D||a||a")).await;
        assert_eq!(relay.backend().calls().len(), 1);
    }
}
