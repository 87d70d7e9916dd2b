//! Error types for the core crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the CSV analysis client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A local upload could not be read.
    #[error("failed to read upload {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Transport, multipart, or body decoding failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered outside the 2xx range.
    #[error("API request failed (status {status})")]
    RequestFailed { status: u16 },
}

/// Errors returned by reply backends and the send pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The CSV analysis client failed.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    /// A required CSV upload has not been configured.
    #[error("no {0} file selected")]
    MissingUpload(&'static str),
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}
