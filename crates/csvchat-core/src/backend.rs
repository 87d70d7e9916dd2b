//! Reply sources for the send pipeline.
//!
//! The API-backed backend forwards each query to the CSV analysis service;
//! the simulated backend answers with a canned reply after a fixed delay.

use crate::client::{CsvBotClient, CsvQuery, UploadFile};
use crate::error::CoreError;
use async_trait::async_trait;
use csvchat_config::{CsvChatConfig, FilesConfig, ReplyMode};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Everything a backend needs to answer one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub query: String,
    pub conversation_id: String,
    pub uploads: FilesConfig,
}

/// A successful reply before it becomes message content.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Plain text stored verbatim.
    Text(String),
    /// A service response, stored as its serialized JSON.
    Json(Value),
}

impl Reply {
    /// Render the reply as assistant message content.
    pub fn into_content(self) -> String {
        match self {
            Reply::Text(text) => text,
            Reply::Json(value) => value.to_string(),
        }
    }
}

/// Produces the assistant side of a turn.
#[async_trait]
pub trait ReplyBackend: Send + Sync {
    /// True when replies come from the remote API.
    fn is_remote(&self) -> bool;

    async fn reply(&self, request: ReplyRequest) -> Result<Reply, CoreError>;
}

/// Canned reply after a fixed delay; for running without the service.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    delay: Duration,
    text: String,
}

impl SimulatedBackend {
    pub fn new(delay: Duration, text: impl Into<String>) -> Self {
        Self {
            delay,
            text: text.into(),
        }
    }
}

#[async_trait]
impl ReplyBackend for SimulatedBackend {
    fn is_remote(&self) -> bool {
        false
    }

    async fn reply(&self, request: ReplyRequest) -> Result<Reply, CoreError> {
        debug!(
            "simulating reply (conversation_id={}, delay_ms={})",
            request.conversation_id,
            self.delay.as_millis()
        );
        tokio::time::sleep(self.delay).await;
        Ok(Reply::Text(self.text.clone()))
    }
}

/// Forwards queries plus the two configured CSV files to the service.
#[derive(Debug, Clone)]
pub struct CsvBackend {
    client: CsvBotClient,
    send_session_id: bool,
}

impl CsvBackend {
    pub fn new(client: CsvBotClient, send_session_id: bool) -> Self {
        Self {
            client,
            send_session_id,
        }
    }
}

#[async_trait]
impl ReplyBackend for CsvBackend {
    fn is_remote(&self) -> bool {
        true
    }

    async fn reply(&self, request: ReplyRequest) -> Result<Reply, CoreError> {
        let payers_path = request
            .uploads
            .payers
            .as_ref()
            .ok_or(CoreError::MissingUpload("payers"))?;
        let transactions_path = request
            .uploads
            .transactions
            .as_ref()
            .ok_or(CoreError::MissingUpload("transactions"))?;
        let payers = UploadFile::from_path(payers_path).await?;
        let transactions = UploadFile::from_path(transactions_path).await?;
        let session_id = self.send_session_id.then_some(request.conversation_id);
        let body = self
            .client
            .ask(CsvQuery {
                query: request.query,
                payers,
                transactions,
                session_id,
            })
            .await?;
        Ok(Reply::Json(body))
    }
}

/// Build the reply backend selected by `reply.mode`.
pub fn backend_from_config(config: &CsvChatConfig) -> Arc<dyn ReplyBackend> {
    match config.reply.mode {
        ReplyMode::Api => {
            info!(
                "using csv analysis backend (endpoint={})",
                config.api.endpoint
            );
            Arc::new(CsvBackend::new(
                CsvBotClient::new(config.api.endpoint.clone()),
                config.api.send_session_id,
            ))
        }
        ReplyMode::Simulated => {
            info!(
                "using simulated backend (delay_ms={})",
                config.reply.simulated_delay_ms
            );
            Arc::new(SimulatedBackend::new(
                Duration::from_millis(config.reply.simulated_delay_ms),
                config.reply.simulated_text.clone(),
            ))
        }
    }
}
