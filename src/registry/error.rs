//! Errors raised while talking to the registry.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single registry request.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot reach registry at {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("registry answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("access token rejected ({0})")]
    Unauthorized(StatusCode),

    /// Body carried the backend's `caused...` error marker.
    #[error("registry error: {0}")]
    Backend(String),

    #[error("malformed instance list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("login rejected with {status}: {body}")]
    LoginRejected { status: StatusCode, body: String },
}

impl RegistryError {
    /// Whether the failure means the access token is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RegistryError::Unauthorized(_))
    }
}
