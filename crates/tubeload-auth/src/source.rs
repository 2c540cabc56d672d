//! Token sources.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AuthResult;

/// OAuth scope for uploading videos.
pub const YOUTUBE_UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// OAuth scope for reading and writing spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// A bearer token with its expiry, when the issuer reported one.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Anything that can mint a bearer token for a set of scopes.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self, scopes: &[&str]) -> AuthResult<AccessToken>;
}

/// Fixed token, for pre-issued credentials and tests.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self, _scopes: &[&str]) -> AuthResult<AccessToken> {
        Ok(AccessToken::new(self.token.clone(), None))
    }
}
