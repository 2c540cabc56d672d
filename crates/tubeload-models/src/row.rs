//! Row identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when building row indices or ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowIndexError {
    #[error("Row index must be positive")]
    Zero,

    #[error("Invalid row range: from ({from}) is greater than to ({to})")]
    Inverted { from: u32, to: u32 },
}

/// 1-based index of a row in the spreadsheet. Doubles as the job identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RowIndex(u32);

impl RowIndex {
    /// Create a row index, rejecting zero.
    pub fn new(value: u32) -> Result<Self, RowIndexError> {
        if value == 0 {
            return Err(RowIndexError::Zero);
        }
        Ok(Self(value))
    }

    /// Get the raw 1-based value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for RowIndex {
    type Error = RowIndexError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RowIndex> for u32 {
    fn from(row: RowIndex) -> Self {
        row.0
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive range of rows `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    from: RowIndex,
    to: RowIndex,
}

impl RowRange {
    /// Create a range, rejecting `from > to`.
    pub fn new(from: RowIndex, to: RowIndex) -> Result<Self, RowIndexError> {
        if from > to {
            return Err(RowIndexError::Inverted {
                from: from.get(),
                to: to.get(),
            });
        }
        Ok(Self { from, to })
    }

    /// Create a range from raw integers.
    pub fn from_bounds(from: u32, to: u32) -> Result<Self, RowIndexError> {
        Self::new(RowIndex::new(from)?, RowIndex::new(to)?)
    }

    /// Number of rows in the range (`to - from + 1`), never zero.
    pub fn row_count(&self) -> usize {
        (self.to.get() - self.from.get()) as usize + 1
    }

    /// Iterate the rows in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RowIndex> {
        (self.from.get()..=self.to.get()).map(RowIndex)
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}
