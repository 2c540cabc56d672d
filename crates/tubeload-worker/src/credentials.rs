//! Credential bootstrap for the binary.
//!
//! Picks one of three sources and returns a primed token cache shared by the
//! Sheets and YouTube clients:
//! - service account, when no OAuth client is configured and
//!   `GOOGLE_APPLICATION_CREDENTIALS` is set
//! - installed-app OAuth with a stored refresh token
//! - installed-app OAuth with interactive consent on stdin

use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tracing::info;
use tubeload_auth::{
    InstalledAppFlow, OAuthConfig, ServiceAccountSource, TokenCache, SHEETS_SCOPE,
    YOUTUBE_UPLOAD_SCOPE,
};

use crate::config::GoogleConfig;
use crate::error::WorkerResult;

/// Scopes every run needs.
pub fn scopes() -> Vec<String> {
    vec![YOUTUBE_UPLOAD_SCOPE.to_string(), SHEETS_SCOPE.to_string()]
}

/// Build a token cache from `config`, reading a consent code from `input`
/// if no stored credential is available.
pub async fn authorize<R>(config: &GoogleConfig, input: R) -> WorkerResult<Arc<TokenCache>>
where
    R: AsyncBufRead + Unpin,
{
    if config.use_service_account() {
        info!("Authorizing with service account");
        let source = ServiceAccountSource::from_env()?;
        let tokens = Arc::new(TokenCache::new(Arc::new(source), scopes()));
        tokens.get_token().await?;
        return Ok(tokens);
    }

    let oauth = OAuthConfig::new(&config.client_id, &config.client_secret, scopes())
        .with_redirect_url(&config.redirect_url);
    authorize_installed_app(oauth, config.refresh_token.clone(), input).await
}

/// Installed-app flow, interactive unless `refresh_token` is given.
pub async fn authorize_installed_app<R>(
    oauth: OAuthConfig,
    refresh_token: Option<String>,
    input: R,
) -> WorkerResult<Arc<TokenCache>>
where
    R: AsyncBufRead + Unpin,
{
    let flow = InstalledAppFlow::new(oauth)?;

    let Some(refresh_token) = refresh_token else {
        let flow = Arc::new(flow);
        let token = flow.authorize_interactive(input).await?;
        if flow.refresh_token().await.is_some() {
            info!("Consent granted; store the refresh token as TUBELOAD_REFRESH_TOKEN to skip this step");
        }
        let tokens = Arc::new(TokenCache::new(flow, scopes()));
        tokens.seed(token).await;
        return Ok(tokens);
    };

    info!("Authorizing with stored refresh token");
    let flow = Arc::new(flow.with_refresh_token(refresh_token));
    let tokens = Arc::new(TokenCache::new(flow, scopes()));
    // Fail at startup rather than on the first row.
    tokens.get_token().await?;
    Ok(tokens)
}
