//! Row processing metrics.

use std::time::Duration;

use metrics::{counter, histogram};
use tubeload_models::OutcomeStatus;

pub mod names {
    pub const ROWS_PROCESSED: &str = "tubeload_rows_processed_total";
    pub const ROW_DURATION: &str = "tubeload_row_duration_seconds";
    pub const WRITE_FAILURES: &str = "tubeload_write_failures_total";
}

/// Record a finished row.
pub fn record_row(status: OutcomeStatus, elapsed: Duration) {
    counter!(names::ROWS_PROCESSED, "status" => status.as_str()).increment(1);
    histogram!(names::ROW_DURATION, "status" => status.as_str()).record(elapsed.as_secs_f64());
}

/// Record a result that could not be written back.
pub fn record_write_failure() {
    counter!(names::WRITE_FAILURES).increment(1);
}
