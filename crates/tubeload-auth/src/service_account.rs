//! Service account credentials via gcp_auth.

use std::sync::Arc;

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};

use crate::error::{AuthError, AuthResult};
use crate::source::{AccessToken, TokenSource};

/// Token source backed by a service account key.
///
/// Works for the Sheets API when the sheet is shared with the service
/// account. Uploads to a personal channel still need the installed-app flow.
pub struct ServiceAccountSource {
    provider: Arc<dyn TokenProvider>,
}

impl ServiceAccountSource {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }

    /// Load the key named by `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn from_env() -> AuthResult<Self> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            AuthError::config(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Self::new(Arc::new(sa))),
            None => Err(AuthError::config(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }
}

#[async_trait]
impl TokenSource for ServiceAccountSource {
    async fn fetch_token(&self, scopes: &[&str]) -> AuthResult<AccessToken> {
        let token = self
            .provider
            .token(scopes)
            .await
            .map_err(|e| AuthError::provider(e.to_string()))?;

        Ok(AccessToken::new(token.as_str(), Some(token.expires_at())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_requires_credentials() {
        std::env::remove_var("GOOGLE_APPLICATION_CREDENTIALS");
        let result = ServiceAccountSource::from_env();
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}
