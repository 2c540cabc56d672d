//! Shared access-token cache.
//!
//! Every client holds the same cache, so all workers reuse one token:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight refresh so concurrent workers do not stampede the issuer
//! - Fallback to the existing token while it is still usable

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};
use crate::source::{AccessToken, TokenSource};

/// Refresh the token 60 seconds before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL assumed when the issuer does not report one.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn from_access_token(token: AccessToken) -> Self {
        let expires_at = match token.expires_at {
            Some(exp) => {
                let now = Utc::now();
                if exp > now {
                    match (exp - now).to_std() {
                        Ok(ttl) => Instant::now() + ttl,
                        Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                    }
                } else {
                    // Already expired: force a refresh on next use.
                    Instant::now()
                }
            }
            None => Instant::now() + TOKEN_DEFAULT_TTL,
        };

        Self {
            access_token: token.secret,
            expires_at,
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache over a `TokenSource`.
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    scopes: Vec<String>,
    cache: RwLock<Option<CachedToken>>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self.cache.try_read() {
            Ok(cache) if cache.is_some() => "cached",
            Ok(_) => "empty",
            Err(_) => "refreshing",
        };
        f.debug_struct("TokenCache")
            .field("scopes", &self.scopes)
            .field("token", &token)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>, scopes: Vec<String>) -> Self {
        Self {
            source,
            scopes,
            cache: RwLock::new(None),
        }
    }

    /// Store a token obtained out of band, e.g. from the code exchange.
    pub async fn seed(&self, token: AccessToken) {
        *self.cache.write().await = Some(CachedToken::from_access_token(token));
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> AuthResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(&mut cache).await
    }

    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> AuthResult<String> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();

        match self.source.fetch_token(&scopes).await {
            Ok(token) => {
                let cached = CachedToken::from_access_token(token);
                let access_token = cached.access_token.clone();
                *cache = Some(cached);
                debug!("Refreshed access token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                Err(AuthError::provider(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}
