//! Recording core store used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::CoreBackend;
use crate::error::CoreError;
use crate::protocol::{ActionResult, Registration};

/// A request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(Registration),
    FetchCommands(String),
    SubmitResult(ActionResult),
}

/// Backend that records calls and answers with canned bodies.
///
/// `reply: None` makes every call fail as if the store were down.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub reply: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn replying(body: &str) -> Self {
        Self {
            reply: Some(body.to_string()),
            calls: Mutex::default(),
        }
    }

    pub fn down() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<String, CoreError> {
        self.calls.lock().unwrap().push(call);
        self.reply.clone().ok_or_else(|| CoreError::Unreachable {
            url: "mock://core".into(),
            message: "connection refused".into(),
        })
    }
}

#[async_trait]
impl CoreBackend for MockBackend {
    async fn register(&self, registration: &Registration) -> Result<String, CoreError> {
        self.record(Call::Register(registration.clone()))
    }

    async fn fetch_commands(&self, uuid: &str) -> Result<String, CoreError> {
        self.record(Call::FetchCommands(uuid.to_string()))
    }

    async fn submit_result(&self, result: &ActionResult) -> Result<(), CoreError> {
        self.record(Call::SubmitResult(result.clone())).map(drop)
    }
}
