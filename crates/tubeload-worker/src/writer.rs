//! Result write-back step.

use std::sync::Arc;

use tubeload_models::{RowIndex, UploadOutcome};
use tubeload_sheets::RowStore;

use crate::error::{WorkerError, WorkerResult};

/// Persists an outcome into its row's output cell.
#[derive(Clone)]
pub struct ResultWriter {
    store: Arc<dyn RowStore>,
    locator_host: String,
}

impl ResultWriter {
    pub fn new(store: Arc<dyn RowStore>, locator_host: impl Into<String>) -> Self {
        Self {
            store,
            locator_host: locator_host.into(),
        }
    }

    pub async fn write(&self, row: RowIndex, outcome: &UploadOutcome) -> WorkerResult<()> {
        let value = outcome.cell_value(&self.locator_host);
        self.store
            .write_cell(row, &value)
            .await
            .map_err(|e| WorkerError::remote_write(row, e.to_string()))
    }
}
