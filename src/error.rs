//! Recoverable errors
//!
//! Contract violations (stale handles, invalid bodies) panic instead; only
//! configuration and factory lookups surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("unknown object kind `{0}`")]
    UnknownObjectKind(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
