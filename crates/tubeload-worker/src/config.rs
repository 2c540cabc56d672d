//! Worker configuration.

use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Minimum size, in bytes, a media file must exceed to be uploaded.
pub const DEFAULT_MIN_FILE_SIZE: u64 = 1024 * 1024;

/// Google credentials and spreadsheet identity.
#[derive(Clone, Default)]
pub struct GoogleConfig {
    /// OAuth client id of the installed app
    pub client_id: String,
    /// OAuth client secret of the installed app
    pub client_secret: String,
    /// Spreadsheet holding the rows
    pub sheet_id: String,
    /// Stored refresh token; skips the consent step when present
    pub refresh_token: Option<String>,
    /// Redirect URL registered for the OAuth client
    pub redirect_url: String,
}

impl GoogleConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("TUBELOAD_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("TUBELOAD_CLIENT_SECRET").unwrap_or_default(),
            sheet_id: std::env::var("TUBELOAD_SHEET_ID").unwrap_or_default(),
            refresh_token: std::env::var("TUBELOAD_REFRESH_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            redirect_url: std::env::var("TUBELOAD_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
        }
    }

    /// Override the spreadsheet id.
    pub fn with_sheet_id(mut self, sheet_id: impl Into<String>) -> Self {
        self.sheet_id = sheet_id.into();
        self
    }

    /// True when no OAuth client is configured but a service account key is.
    pub fn use_service_account(&self) -> bool {
        self.client_id.trim().is_empty()
            && std::env::var("GOOGLE_APPLICATION_CREDENTIALS").is_ok()
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.sheet_id.trim().is_empty() {
            return Err(WorkerError::config(
                "spreadsheet id is required (TUBELOAD_SHEET_ID or --sheet-id)",
            ));
        }
        Ok(())
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("sheet_id", &self.sheet_id)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent workers
    pub concurrency: usize,
    /// Files at or below this size are rejected as likely export errors
    pub min_file_size: u64,
    /// Deadline for one upload
    pub upload_timeout: Duration,
    /// Deadline for one result write-back
    pub write_timeout: Duration,
    /// Abort the whole run when a write-back fails
    pub abort_on_write_failure: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            upload_timeout: Duration::from_secs(3600), // 1 hour
            write_timeout: Duration::from_secs(60),
            abort_on_write_failure: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            concurrency: std::env::var("TUBELOAD_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(3),
            min_file_size: std::env::var("TUBELOAD_MIN_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MIN_FILE_SIZE),
            upload_timeout: Duration::from_secs(
                std::env::var("TUBELOAD_UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            write_timeout: Duration::from_secs(
                std::env::var("TUBELOAD_WRITE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            abort_on_write_failure: std::env::var("TUBELOAD_ABORT_ON_WRITE_FAILURE")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "TUBELOAD_CONCURRENCY",
        "TUBELOAD_MIN_FILE_SIZE",
        "TUBELOAD_UPLOAD_TIMEOUT_SECS",
        "TUBELOAD_WRITE_TIMEOUT_SECS",
        "TUBELOAD_ABORT_ON_WRITE_FAILURE",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_worker_config_defaults() {
        clear();
        let config = WorkerConfig::from_env();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.min_file_size, 1024 * 1024);
        assert_eq!(config.upload_timeout, Duration::from_secs(3600));
        assert_eq!(config.write_timeout, Duration::from_secs(60));
        assert!(!config.abort_on_write_failure);
    }

    #[test]
    #[serial]
    fn test_worker_config_overrides() {
        clear();
        std::env::set_var("TUBELOAD_CONCURRENCY", "0");
        std::env::set_var("TUBELOAD_MIN_FILE_SIZE", "10");
        std::env::set_var("TUBELOAD_ABORT_ON_WRITE_FAILURE", "TRUE");
        let config = WorkerConfig::from_env();
        clear();

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.min_file_size, 10);
        assert!(config.abort_on_write_failure);
    }

    #[test]
    fn test_google_config_requires_sheet_id() {
        assert!(GoogleConfig::default().validate().is_err());
        assert!(GoogleConfig::default().with_sheet_id("abc").validate().is_ok());
    }

    #[test]
    fn test_google_config_debug_redacts_secrets() {
        let config = GoogleConfig {
            client_secret: "hunter2".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            ..GoogleConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("1//refresh"));
    }
}
