//! Errors raised while reading, merging, or checking config layers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer file exists in the stack but could not be read.
    #[error("cannot read config layer {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON5 syntax error in a layer or inline contents.
    #[error("cannot parse {origin} as json5: {source}")]
    Parse {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged value does not fit the typed model.
    #[error("config does not match the csvchat model: {0}")]
    Decode(#[from] serde_json::Error),
    /// Unknown key, wrong type, or a value outside its allowed range.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}
