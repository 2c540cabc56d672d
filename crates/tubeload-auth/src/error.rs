//! Authorization error types.

use thiserror::Error;

/// Result type for authorization operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while obtaining credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth configuration error: {0}")]
    Config(String),

    #[error("Authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("No refresh token available, run the authorization flow first")]
    MissingRefreshToken,

    #[error("Token provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AuthError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}
