//! Structured row logging.
//!
//! Every lifecycle event of a row carries the row index and the run id, so
//! interleaved output from concurrent workers stays attributable.

use tracing::{error, info, warn, Span};
use tubeload_models::RowIndex;

/// Logger bound to one row of one run.
#[derive(Debug, Clone)]
pub struct RowLogger {
    row: RowIndex,
    run_id: String,
}

impl RowLogger {
    pub fn new(row: RowIndex, run_id: &str) -> Self {
        Self {
            row,
            run_id: run_id.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(row = %self.row, run_id = %self.run_id, "Row started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(row = %self.row, run_id = %self.run_id, "Row progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(row = %self.row, run_id = %self.run_id, "Row warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(row = %self.row, run_id = %self.run_id, "Row error: {}", message);
    }

    /// Emit the per-row completion line.
    pub fn log_done(&self, status: &str) {
        info!(
            row = %self.row,
            run_id = %self.run_id,
            status = %status,
            "done with row {}", self.row
        );
    }

    pub fn row(&self) -> RowIndex {
        self.row
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Span covering all work on this row.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("row", row = %self.row, run_id = %self.run_id)
    }
}
