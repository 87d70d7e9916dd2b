use async_trait::async_trait;
use csvchat_core::{CoreError, Reply, ReplyBackend, ReplyRequest};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Backend that always answers with the same JSON body.
#[derive(Debug, Clone)]
pub struct FixedBackend {
    body: Value,
    remote: bool,
}

impl FixedBackend {
    pub fn new(body: Value) -> Self {
        Self { body, remote: true }
    }

    pub fn local(mut self) -> Self {
        self.remote = false;
        self
    }
}

#[async_trait]
impl ReplyBackend for FixedBackend {
    fn is_remote(&self) -> bool {
        self.remote
    }

    async fn reply(&self, _request: ReplyRequest) -> Result<Reply, CoreError> {
        Ok(Reply::Json(self.body.clone()))
    }
}

/// Backend that always fails.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    message: String,
}

impl FailingBackend {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ReplyBackend for FailingBackend {
    fn is_remote(&self) -> bool {
        true
    }

    async fn reply(&self, _request: ReplyRequest) -> Result<Reply, CoreError> {
        Err(CoreError::Backend(self.message.clone()))
    }
}

/// Backend that records every request and answers with fixed text.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    text: String,
    seen: Arc<Mutex<Vec<ReplyRequest>>>,
}

impl RecordingBackend {
    pub fn new(text: impl Into<String>) -> (Self, Arc<Mutex<Vec<ReplyRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                text: text.into(),
                seen: seen.clone(),
            },
            seen,
        )
    }
}

#[async_trait]
impl ReplyBackend for RecordingBackend {
    fn is_remote(&self) -> bool {
        false
    }

    async fn reply(&self, request: ReplyRequest) -> Result<Reply, CoreError> {
        self.seen.lock().push(request);
        Ok(Reply::Text(self.text.clone()))
    }
}
