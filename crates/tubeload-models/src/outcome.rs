//! Per-row upload outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable status of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Uploaded,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Uploaded => "uploaded",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of processing one row. Exactly one is produced per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Upload accepted; `locator` is the id assigned by the host.
    Success { locator: String },
    /// Human-readable reason the row was not uploaded.
    Failure { reason: String },
}

impl UploadOutcome {
    pub fn success(locator: impl Into<String>) -> Self {
        Self::Success {
            locator: locator.into(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            UploadOutcome::Success { .. } => OutcomeStatus::Uploaded,
            UploadOutcome::Failure { .. } => OutcomeStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    /// Single-string form written to the output cell.
    ///
    /// Success becomes `https://{host}/{locator}`, failure is the reason verbatim.
    pub fn cell_value(&self, locator_host: &str) -> String {
        match self {
            UploadOutcome::Success { locator } => {
                format!("https://{}/{}", locator_host.trim_end_matches('/'), locator)
            }
            UploadOutcome::Failure { reason } => reason.clone(),
        }
    }
}
