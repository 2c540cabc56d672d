//! Worker error types.

use thiserror::Error;
use tubeload_models::RowIndex;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to read row {row}: {reason}")]
    RemoteRead { row: RowIndex, reason: String },

    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: RowIndex, reason: String },

    #[error("Failed to write result for row {row}: {reason}")]
    RemoteWrite { row: RowIndex, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run cancelled after {completed} of {total} rows")]
    Cancelled { completed: usize, total: usize },

    #[error("Authorization error: {0}")]
    Auth(#[from] tubeload_auth::AuthError),
}

impl WorkerError {
    pub fn remote_read(row: RowIndex, reason: impl Into<String>) -> Self {
        Self::RemoteRead {
            row,
            reason: reason.into(),
        }
    }

    pub fn malformed_row(row: RowIndex, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            row,
            reason: reason.into(),
        }
    }

    pub fn remote_write(row: RowIndex, reason: impl Into<String>) -> Self {
        Self::RemoteWrite {
            row,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Row the error is about, if it concerns a single row.
    pub fn row(&self) -> Option<RowIndex> {
        match self {
            WorkerError::RemoteRead { row, .. }
            | WorkerError::MalformedRow { row, .. }
            | WorkerError::RemoteWrite { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// Check if the run was stopped from outside rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled { .. })
    }
}
