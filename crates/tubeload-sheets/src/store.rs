//! Row store abstraction.

use async_trait::async_trait;
use tubeload_models::RowIndex;

use crate::error::SheetsResult;
use crate::types::RawRow;

/// A remote table addressed by row: read one row, write one result cell.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Rows returned for `row`. A well-formed sheet yields exactly one.
    async fn read_row(&self, row: RowIndex) -> SheetsResult<Vec<RawRow>>;

    /// Overwrite the designated output cell of `row` with `value`.
    async fn write_cell(&self, row: RowIndex, value: &str) -> SheetsResult<()>;
}
