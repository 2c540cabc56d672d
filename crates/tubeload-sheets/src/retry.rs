//! Backoff for the two calls tubeload makes against a sheet.
//!
//! Both are replayable: a row read is a GET and a result write is a RAW PUT
//! of one fixed cell, so a replay can only land the same value again. Writes
//! run under the worker's write timeout and get a smaller budget.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info_span, warn, Instrument};

use crate::error::SheetsResult;
use crate::metrics::record_retry;

/// Which of the two sheet calls is being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetsRequest {
    /// GET of one row's input columns.
    ReadRow,
    /// PUT of one row's output cell.
    WriteCell,
}

impl SheetsRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetsRequest::ReadRow => "read_row",
            SheetsRequest::WriteCell => "write_cell",
        }
    }
}

/// Retry budget and backoff bounds for sheet calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub read_retries: u32,
    pub write_retries: u32,
    /// Shortest pause between attempts.
    pub base_delay: Duration,
    /// Ceiling for the exponential window.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            read_retries: 4,
            write_retries: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Defaults overridden by `SHEETS_READ_RETRIES`, `SHEETS_WRITE_RETRIES`,
    /// `SHEETS_RETRY_BASE_MS` and `SHEETS_RETRY_MAX_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let millis = |name: &str, fallback: Duration| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        Self {
            read_retries: std::env::var("SHEETS_READ_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.read_retries),
            write_retries: std::env::var("SHEETS_WRITE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.write_retries),
            base_delay: millis("SHEETS_RETRY_BASE_MS", defaults.base_delay),
            max_delay: millis("SHEETS_RETRY_MAX_MS", defaults.max_delay),
        }
    }

    /// Every call is attempted exactly once.
    pub fn disabled() -> Self {
        Self {
            read_retries: 0,
            write_retries: 0,
            ..Self::default()
        }
    }

    pub fn retries_for(&self, request: SheetsRequest) -> u32 {
        match request {
            SheetsRequest::ReadRow => self.read_retries,
            SheetsRequest::WriteCell => self.write_retries,
        }
    }

    /// Pause before retry number `attempt` (0-based).
    ///
    /// A server-supplied Retry-After wins. Otherwise the pause is drawn
    /// uniformly from `[base, min(base * 2^attempt, max)]`.
    pub fn backoff(&self, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
        if let Some(after) = retry_after_ms {
            return Duration::from_millis(after);
        }

        let window = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        if window <= self.base_delay {
            return window;
        }

        let low = self.base_delay.as_millis() as u64;
        let high = window.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(low..=high))
    }

    /// Run `op`, replaying it on network errors, 429 and 5xx until the
    /// budget for `request` is spent.
    pub async fn run<T, F, Fut>(&self, request: SheetsRequest, op: F) -> SheetsResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SheetsResult<T>>,
    {
        let retries = self.retries_for(request);
        let mut attempt = 0;

        loop {
            let span = info_span!("sheets_attempt", request = request.as_str(), attempt = attempt + 1);
            let err = match op().instrument(span).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            if !err.is_retryable() || attempt >= retries {
                return Err(err);
            }

            let pause = self.backoff(attempt, err.retry_after_ms());
            warn!(
                request = request.as_str(),
                attempt = attempt + 1,
                pause_ms = pause.as_millis() as u64,
                error = %err,
                "Sheets call failed, retrying"
            );
            record_retry(request.as_str());
            tokio::time::sleep(pause).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetsError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            read_retries: 3,
            write_retries: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    async fn count_calls(policy: &RetryPolicy, request: SheetsRequest, status: u16) -> u32 {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: SheetsResult<()> = policy
            .run(request, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SheetsError::from_http_status(status, "nope"))
            })
            .await;
        assert!(result.is_err());
        calls.load(Ordering::SeqCst)
    }

    #[test]
    fn test_writes_get_smaller_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.retries_for(SheetsRequest::WriteCell) < policy.retries_for(SheetsRequest::ReadRow));
        assert_eq!(RetryPolicy::disabled().retries_for(SheetsRequest::ReadRow), 0);
    }

    #[test]
    fn test_retry_after_wins() {
        let delay = RetryPolicy::default().backoff(0, Some(2000));
        assert_eq!(delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_stays_in_window() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(5000),
            ..RetryPolicy::default()
        };
        for _ in 0..64 {
            let first = policy.backoff(0, None);
            assert_eq!(first, Duration::from_millis(100));

            let third = policy.backoff(2, None);
            assert!(third >= Duration::from_millis(100) && third <= Duration::from_millis(400));

            let late = policy.backoff(40, None);
            assert!(late <= Duration::from_millis(5000));
        }
    }

    #[test]
    fn test_backoff_is_not_clock_driven() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(5000),
            ..RetryPolicy::default()
        };
        let samples: Vec<Duration> = (0..32).map(|_| policy.backoff(5, None)).collect();

        let distinct: HashSet<_> = samples.iter().collect();
        assert!(distinct.len() > 8);
        // Back-to-back draws must not climb like a clock reading.
        let rising = samples.windows(2).filter(|w| w[1] > w[0]).count();
        assert!(rising < samples.len() - 1);
    }

    #[tokio::test]
    async fn test_read_is_replayed_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast()
            .run(SheetsRequest::ReadRow, move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(SheetsError::from_http_status(503, "unavailable"))
                } else {
                    Ok("row")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "row");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_depends_on_request() {
        assert_eq!(count_calls(&fast(), SheetsRequest::ReadRow, 500).await, 4);
        assert_eq!(count_calls(&fast(), SheetsRequest::WriteCell, 500).await, 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_replayed() {
        assert_eq!(count_calls(&fast(), SheetsRequest::WriteCell, 400).await, 1);
        assert_eq!(count_calls(&fast(), SheetsRequest::ReadRow, 404).await, 1);
    }
}
