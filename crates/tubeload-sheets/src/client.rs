//! Sheets v4 REST client.
//!
//! - Shared token cache, with one re-auth on expired tokens
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter on transient failures
//! - Tracing spans and request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info_span, Instrument};
use tubeload_auth::TokenCache;
use tubeload_models::RowIndex;
use url::Url;

use crate::error::{SheetsError, SheetsResult};
use crate::metrics::record_call;
use crate::retry::{RetryPolicy, SheetsRequest};
use crate::store::RowStore;
use crate::types::{is_column_label, CellRange, RawRow, UpdateValuesResponse, ValueRange};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Sheets client configuration.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet ID
    pub sheet_id: String,
    /// Tab holding the rows
    pub sheet_name: String,
    /// First column read for a row
    pub first_column: String,
    /// Last column read for a row
    pub last_column: String,
    /// Column receiving the result
    pub output_column: String,
    /// API root, overridable for tests
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry budget per request kind
    pub retry: RetryPolicy,
}

impl SheetsConfig {
    pub fn new(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            sheet_name: "Sheet1".to_string(),
            first_column: "A".to_string(),
            last_column: "J".to_string(),
            output_column: "L".to_string(),
            base_url: SHEETS_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }

    /// Create config for `sheet_id`, reading the rest from the environment.
    pub fn from_env(sheet_id: impl Into<String>) -> Self {
        let defaults = Self::new(sheet_id);

        let connect_timeout_secs: u64 = std::env::var("SHEETS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Self {
            sheet_name: std::env::var("TUBELOAD_SHEET_NAME").unwrap_or(defaults.sheet_name.clone()),
            output_column: std::env::var("TUBELOAD_OUTPUT_COLUMN")
                .unwrap_or(defaults.output_column.clone()),
            base_url: std::env::var("SHEETS_BASE_URL").unwrap_or(defaults.base_url.clone()),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryPolicy::from_env(),
            ..defaults
        }
    }

    fn validate(&self) -> SheetsResult<()> {
        if self.sheet_id.trim().is_empty() {
            return Err(SheetsError::config("spreadsheet id cannot be empty"));
        }
        for column in [&self.first_column, &self.last_column, &self.output_column] {
            if !is_column_label(column) {
                return Err(SheetsError::config(format!(
                    "invalid column label '{}'",
                    column
                )));
            }
        }
        Ok(())
    }
}

/// Sheets REST API client.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    config: SheetsConfig,
    tokens: Arc<TokenCache>,
}

impl SheetsClient {
    /// Create a new client sharing `tokens` with the other Google clients.
    pub fn new(config: SheetsConfig, tokens: Arc<TokenCache>) -> SheetsResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("tubeload-sheets/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SheetsError::Network)?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    /// Range read for a row (`Sheet1!A{n}:J{n}` by default).
    pub fn read_range(&self, row: RowIndex) -> CellRange {
        CellRange::row_span(
            &self.config.sheet_name,
            &self.config.first_column,
            &self.config.last_column,
            row,
        )
    }

    /// Cell receiving a row's result (`Sheet1!L{n}:L{n}` by default).
    pub fn output_range(&self, row: RowIndex) -> CellRange {
        CellRange::single_cell(&self.config.sheet_name, &self.config.output_column, row)
    }

    fn values_url(&self, range: &CellRange) -> SheetsResult<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| SheetsError::config(format!("invalid base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::config("base url cannot be a base"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.config.sheet_id.as_str(), "values"])
            .push(&range.to_string());
        Ok(url)
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    // =========================================================================
    // Values API
    // =========================================================================

    /// Read a range.
    pub async fn get_values(&self, range: &CellRange) -> SheetsResult<ValueRange> {
        let url = self.values_url(range)?;
        let range_label = range.to_string();

        self.config.retry.run(SheetsRequest::ReadRow, || {
            self.execute_request(SheetsRequest::ReadRow, &range_label, async {
                let response = self.send_authorized(|token| self.http.get(url.clone()).bearer_auth(token)).await?;

                match response.status() {
                    StatusCode::OK => Ok(response.json::<ValueRange>().await?),
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    /// Overwrite a range with a single raw string value.
    pub async fn update_value(&self, range: &CellRange, value: &str) -> SheetsResult<()> {
        let mut url = self.values_url(range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = ValueRange::single_cell(range, value);
        let range_label = range.to_string();

        self.config.retry.run(SheetsRequest::WriteCell, || {
            self.execute_request(SheetsRequest::WriteCell, &range_label, async {
                let response = self
                    .send_authorized(|token| self.http.put(url.clone()).bearer_auth(token).json(&body))
                    .await?;

                match response.status() {
                    StatusCode::OK => {
                        let update: UpdateValuesResponse = response.json().await?;
                        debug!(
                            range = %range_label,
                            updated_cells = update.updated_cells.unwrap_or(0),
                            "Updated sheet range"
                        );
                        Ok(())
                    }
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send with a bearer token, re-authenticating once if it has expired.
    async fn send_authorized<F>(&self, build: F) -> SheetsResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.tokens.get_token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(SheetsError::from_http_status(401, body));
        }

        self.tokens.invalidate().await;
        let token = self.tokens.get_token().await?;
        Ok(build(&token).send().await?)
    }

    /// Run one attempt of `request` inside a span and record its outcome.
    async fn execute_request<T, F>(&self, request: SheetsRequest, range: &str, fut: F) -> SheetsResult<T>
    where
        F: std::future::Future<Output = SheetsResult<T>>,
    {
        let span = info_span!("sheets_request", request = request.as_str(), range = %range);

        let start = Instant::now();
        let result = fut.instrument(span).await;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_call(request, status, start.elapsed());

        result
    }

    async fn handle_error_response(status: StatusCode, url: &Url, response: Response) -> SheetsError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);
            if let Some(ms) = retry_after_ms {
                return SheetsError::RateLimited(ms);
            }
        }

        let body = response.text().await.unwrap_or_default();
        SheetsError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

#[async_trait]
impl RowStore for SheetsClient {
    async fn read_row(&self, row: RowIndex) -> SheetsResult<Vec<RawRow>> {
        let range = self.read_range(row);
        let values = self.get_values(&range).await?;
        Ok(values.values)
    }

    async fn write_cell(&self, row: RowIndex, value: &str) -> SheetsResult<()> {
        let range = self.output_range(row);
        self.update_value(&range, value).await
    }
}
