//! Multipart client for the CSV analysis service.

use crate::error::ClientError;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;

const CSV_MIME: &str = "text/csv";

/// A file payload attached to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file, keeping its file name for the multipart part.
    ///
    /// Contents are not validated; any file is sent as-is.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Upload {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        Ok(Self::new(file_name, bytes))
    }

    fn into_part(self) -> Result<Part, ClientError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(CSV_MIME)?)
    }
}

/// One question about the two uploaded CSV files.
#[derive(Debug, Clone)]
pub struct CsvQuery {
    pub query: String,
    pub payers: UploadFile,
    pub transactions: UploadFile,
    pub session_id: Option<String>,
}

/// Client for the remote CSV analysis endpoint.
#[derive(Debug, Clone)]
pub struct CsvBotClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CsvBotClient {
    /// Create a client for `endpoint` with a default HTTP client.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), endpoint)
    }

    /// Create a client reusing an existing HTTP client.
    pub fn with_http_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the query and both files as one multipart request.
    ///
    /// Makes a single attempt: no retry, timeout, or cancellation. Resolves
    /// with the parsed JSON body when the status is 2xx.
    pub async fn ask(&self, query: CsvQuery) -> Result<Value, ClientError> {
        info!(
            "sending csv query (endpoint={}, query_len={}, payers_len={}, transactions_len={}, session_set={})",
            self.endpoint,
            query.query.len(),
            query.payers.bytes.len(),
            query.transactions.bytes.len(),
            query.session_id.is_some()
        );
        let mut form = Form::new()
            .text("query", query.query)
            .part("payers", query.payers.into_part()?)
            .part("transactions", query.transactions.into_part()?);
        if let Some(session_id) = query.session_id {
            form = form.text("sessionId", session_id);
        }

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!("csv query rejected (status={})", status.as_u16());
            return Err(ClientError::RequestFailed {
                status: status.as_u16(),
            });
        }
        let body = response.json::<Value>().await?;
        debug!("csv query answered (status={})", status.as_u16());
        Ok(body)
    }
}
