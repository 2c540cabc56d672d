//! OAuth 2.0 installed-app flow.
//!
//! The user opens a consent URL, pastes the returned code, and the code is
//! exchanged for an access token plus a refresh token. Later tokens are
//! minted from the refresh token without further interaction.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::error::{AuthError, AuthResult};
use crate::source::{AccessToken, TokenSource};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth client configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Consent page endpoint
    pub auth_url: String,
    /// Token exchange endpoint
    pub token_url: String,
    pub scopes: Vec<String>,
    pub timeout: Duration,
}

impl OAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: "http://localhost:8080".to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            scopes,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = redirect_url.into();
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    fn validate(&self) -> AuthResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::config("OAuth client id cannot be empty"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(AuthError::config("OAuth client secret cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        let expires_at = self
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        AccessToken::new(self.access_token, expires_at)
    }
}

/// Installed-app OAuth client.
pub struct InstalledAppFlow {
    http: Client,
    config: OAuthConfig,
    refresh_token: RwLock<Option<String>>,
}

impl InstalledAppFlow {
    pub fn new(config: OAuthConfig) -> AuthResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tubeload-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            refresh_token: RwLock::new(None),
        })
    }

    /// Start from a refresh token saved by an earlier authorization.
    pub fn with_refresh_token(self, refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: RwLock::new(Some(refresh_token.into())),
            ..self
        }
    }

    /// Consent page URL the user has to visit.
    pub fn authorization_url(&self, state: &str) -> AuthResult<Url> {
        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> AuthResult<AccessToken> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::Exchange("authorization code is empty".to_string()));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("{}: {}", status, body)));
        }

        let tokens: TokenResponse = response.json().await?;
        if let Some(refresh) = tokens.refresh_token.clone() {
            *self.refresh_token.write().await = Some(refresh);
        }

        info!("Authorization code exchanged for access token");
        Ok(tokens.into_access_token())
    }

    /// Mint a new access token from the stored refresh token.
    pub async fn refresh(&self) -> AuthResult<AccessToken> {
        let refresh_token = self
            .refresh_token
            .read()
            .await
            .clone()
            .ok_or(AuthError::MissingRefreshToken)?;

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Refresh(format!("{}: {}", status, body)));
        }

        let tokens: TokenResponse = response.json().await?;
        // Google may rotate the refresh token.
        if let Some(rotated) = tokens.refresh_token.clone() {
            *self.refresh_token.write().await = Some(rotated);
        }

        debug!("Refreshed OAuth access token");
        Ok(tokens.into_access_token())
    }

    /// Refresh token currently held, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.refresh_token.read().await.clone()
    }

    /// Run the interactive consent flow: print the URL, read the code from `input`.
    pub async fn authorize_interactive<R>(&self, input: R) -> AuthResult<AccessToken>
    where
        R: AsyncBufRead + Unpin,
    {
        let url = self.authorization_url("state")?;
        println!(
            "Visit the URL for the auth dialog and then paste the 'code' from the response here: {}",
            url
        );

        let code = read_code(input).await?;
        self.exchange_code(&code).await
    }
}

#[async_trait]
impl TokenSource for InstalledAppFlow {
    async fn fetch_token(&self, _scopes: &[&str]) -> AuthResult<AccessToken> {
        // Scopes were fixed at consent time.
        self.refresh().await
    }
}

/// Read the first non-blank line from `input`.
async fn read_code<R>(mut input: R) -> AuthResult<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line).await? == 0 {
            return Err(AuthError::Exchange(
                "input closed before an authorization code was entered".to_string(),
            ));
        }
        let code = line.trim();
        if !code.is_empty() {
            return Ok(code.to_string());
        }
    }
}
