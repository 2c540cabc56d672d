//! YouTube client error types.

use thiserror::Error;

/// Result type for YouTube operations.
pub type YouTubeResult<T> = Result<T, YouTubeError>;

/// Errors that can occur during an upload.
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request failed ({0}): {1}")]
    RequestFailed(u16, String),

    #[error("Upload session missing Location header")]
    MissingUploadLocation,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Auth error: {0}")]
    Auth(#[from] tubeload_auth::AuthError),
}

impl YouTubeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map an HTTP error status to an error variant.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            400 => Self::BadRequest(msg),
            401 => Self::AuthError(msg),
            403 => Self::Forbidden(msg),
            _ => Self::RequestFailed(status, msg),
        }
    }
}
