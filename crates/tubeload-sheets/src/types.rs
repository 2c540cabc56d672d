//! Sheets API wire types and A1 ranges.

use std::fmt;

use serde::{Deserialize, Serialize};
use tubeload_models::RowIndex;

/// One row as returned by the values API, cells in column order.
///
/// Trailing empty cells are omitted by the API, so rows can be shorter
/// than the requested span.
pub type RawRow = Vec<serde_json::Value>;

/// Body of `spreadsheets.values.get` / `spreadsheets.values.update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<RawRow>,
}

impl ValueRange {
    /// A single cell holding `value`.
    pub fn single_cell(range: &CellRange, value: impl Into<String>) -> Self {
        Self {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: vec![vec![serde_json::Value::String(value.into())]],
        }
    }
}

/// Response of `spreadsheets.values.update`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_cells: Option<u32>,
}

/// An A1-notation span of columns within a single row, e.g. `Sheet1!A3:J3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    sheet: String,
    first_column: String,
    last_column: String,
    row: RowIndex,
}

impl CellRange {
    pub fn row_span(
        sheet: impl Into<String>,
        first_column: impl Into<String>,
        last_column: impl Into<String>,
        row: RowIndex,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            first_column: first_column.into(),
            last_column: last_column.into(),
            row,
        }
    }

    pub fn single_cell(sheet: impl Into<String>, column: impl Into<String>, row: RowIndex) -> Self {
        let column = column.into();
        Self::row_span(sheet, column.clone(), column, row)
    }

    pub fn row(&self) -> RowIndex {
        self.row
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}:{}{}",
            quote_sheet_name(&self.sheet),
            self.first_column,
            self.row,
            self.last_column,
            self.row
        )
    }
}

/// Sheet names with anything but letters, digits and `_` must be quoted.
fn quote_sheet_name(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// True if `column` is a valid A1 column label (`A`, `L`, `AB`...).
pub fn is_column_label(column: &str) -> bool {
    !column.is_empty() && column.chars().all(|c| c.is_ascii_uppercase())
}
