//! Counters for sheet reads and result writes.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::retry::SheetsRequest;

pub mod names {
    /// Attempts, labelled by request and outcome class.
    pub const CALLS: &str = "tubeload_sheets_calls_total";
    /// Attempt duration in seconds, labelled by request.
    pub const CALL_DURATION: &str = "tubeload_sheets_call_duration_seconds";
    /// Replays after a retryable failure, labelled by request.
    pub const RETRIES: &str = "tubeload_sheets_retries_total";
}

/// Outcome class for an HTTP status; `0` means no response arrived.
pub fn outcome_label(status: u16) -> &'static str {
    match status {
        0 => "transport",
        200..=299 => "ok",
        401 | 403 => "denied",
        429 => "throttled",
        400..=499 => "client_error",
        _ => "server_error",
    }
}

/// Record one attempt of `request`.
pub fn record_call(request: SheetsRequest, status: u16, elapsed: Duration) {
    counter!(
        names::CALLS,
        "request" => request.as_str(),
        "outcome" => outcome_label(status)
    )
    .increment(1);
    histogram!(names::CALL_DURATION, "request" => request.as_str()).record(elapsed.as_secs_f64());
}

pub fn record_retry(request: &'static str) {
    counter!(names::RETRIES, "request" => request).increment(1);
}
