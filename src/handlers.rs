//! Mode handlers.
//!
//! Each handler takes the `data` field of a request, talks to the core
//! store, and returns the reply body for the agent. Store failures never
//! surface as errors here: they become in-band reply text or are dropped.

use tracing::{debug, info, instrument, warn};

use crate::backend::CoreBackend;
use crate::commands;
use crate::protocol::{ActionResult, Registration, DONE, NO_COMMANDS, NO_RESULTS, UNREACHABLE};

/// `C`: register an agent and pass the store's reply through.
///
/// `data` is `uuid||interval||delta||hostname`. With fewer than four
/// fields nothing is sent and the reply body is empty.
#[instrument(skip(backend, data))]
pub async fn register<B: CoreBackend + ?Sized>(backend: &B, data: &str) -> String {
    let Some(registration) = Registration::parse(data) else {
        warn!(data_len = data.len(), "Registration has fewer than four fields");
        return String::new();
    };

    match backend.register(&registration).await {
        Ok(body) => {
            info!(uuid = %registration.uuid, hostname = %registration.hostname, "Agent registered");
            body
        }
        Err(e) => {
            warn!(error = %e, "Registration failed");
            UNREACHABLE.to_string()
        }
    }
}

/// `D`: fetch pending commands for the agent `uuid`.
///
/// Replies `0:0:0` when nothing is pending, otherwise the compact
/// `id:mode:arguments<||>...` list.
#[instrument(skip(backend))]
pub async fn fetch_commands<B: CoreBackend + ?Sized>(backend: &B, uuid: &str) -> String {
    let body = match backend.fetch_commands(uuid).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Command fetch failed");
            return UNREACHABLE.to_string();
        }
    };

    if body == "[]" {
        return NO_COMMANDS.to_string();
    }
    commands::reformat(&body)
}

/// `E`: forward `actionid:result` entries to the store.
///
/// Always replies `Done`. Entries are submitted one at a time; entries with
/// a non-integer action id are skipped and store failures are ignored.
/// The agent id is not part of the store request.
#[instrument(skip(backend, data))]
pub async fn submit_results<B: CoreBackend + ?Sized>(
    backend: &B,
    agent_id: &str,
    data: &str,
) -> String {
    if data == NO_RESULTS {
        return DONE.to_string();
    }
    debug!(data_len = data.len(), "Submitting results");

    for result in ActionResult::parse_list(data) {
        submit_one(backend, &result).await;
    }
    DONE.to_string()
}

async fn submit_one<B: CoreBackend + ?Sized>(backend: &B, result: &ActionResult) {
    if !result.has_numeric_id() {
        debug!(actionid = %result.actionid, "Skipping result with non-numeric action id");
        return;
    }
    if let Err(e) = backend.submit_result(result).await {
        debug!(actionid = %result.actionid, error = %e, "Result submission failed");
    }
}
