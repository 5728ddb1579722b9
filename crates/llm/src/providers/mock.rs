//! Scripted generation provider for tests and offline runs.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use edurag_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One canned outcome of a `complete` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful response with this text
    Text(String),
    /// Non-success HTTP status, optionally with a retry hint
    Status {
        status: u16,
        retry_after: Option<Duration>,
    },
    /// Transport-level failure
    Failure(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }

    pub fn status(status: u16) -> Self {
        MockReply::Status {
            status,
            retry_after: None,
        }
    }

    fn into_result(self, model: &str) -> AppResult<LlmResponse> {
        match self {
            MockReply::Text(text) => Ok(LlmResponse::new(text, model)),
            MockReply::Status {
                status,
                retry_after,
            } => Err(AppError::LlmStatus {
                status,
                message: format!("mock status {}", status),
                retry_after,
            }),
            MockReply::Failure(message) => Err(AppError::Llm(message)),
        }
    }
}

type Handler = Box<dyn Fn(&LlmRequest) -> MockReply + Send + Sync>;

/// Mock client.
///
/// Replies are taken from the scripted queue first; once it is empty the
/// handler (if any) decides, otherwise a fixed offline answer is returned.
/// Every request is recorded for later inspection.
pub struct MockClient {
    replies: Mutex<VecDeque<MockReply>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<LlmRequest>>,
    calls: AtomicUsize,
    credentials: bool,
}

impl MockClient {
    /// Create a mock that answers every call with an offline placeholder.
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            handler: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            credentials: true,
        }
    }

    /// Queue replies consumed in order.
    pub fn with_replies(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        lock(&self.replies).extend(replies);
        self
    }

    /// Decide replies from the request once the queue is drained.
    pub fn with_handler(
        mut self,
        handler: impl Fn(&LlmRequest) -> MockReply + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Pretend the credential is missing.
    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received.
    pub fn requests(&self) -> Vec<LlmRequest> {
        lock(&self.requests).clone()
    }

    fn next_reply(&self, request: &LlmRequest) -> MockReply {
        if let Some(reply) = lock(&self.replies).pop_front() {
            return reply;
        }
        match &self.handler {
            Some(handler) => handler(request),
            None => MockReply::Text(format!(
                "Offline answer for: {}",
                request.prompt.lines().next().unwrap_or_default()
            )),
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());
        self.next_reply(request).into_result(&request.model)
    }
}
