//! Google authorization for tubeload.
//!
//! This crate provides:
//! - The `TokenSource` seam every authenticated client goes through
//! - OAuth installed-app flow (consent URL, code exchange, refresh)
//! - Service account tokens via gcp_auth
//! - A shared token cache with refresh margin and single-flight refresh

pub mod error;
pub mod oauth;
pub mod service_account;
pub mod source;
pub mod token_cache;

pub use error::{AuthError, AuthResult};
pub use oauth::{InstalledAppFlow, OAuthConfig};
pub use service_account::ServiceAccountSource;
pub use source::{AccessToken, StaticTokenSource, TokenSource, SHEETS_SCOPE, YOUTUBE_UPLOAD_SCOPE};
pub use token_cache::TokenCache;
