//! Shared data models for tubeload.
//!
//! This crate provides:
//! - Row identity (`RowIndex`) and inclusive ranges of rows
//! - The per-row job description derived from a spreadsheet row
//! - The success-or-failure outcome persisted back to the sheet

pub mod job;
pub mod outcome;
pub mod row;

pub use job::JobDescriptor;
pub use outcome::{OutcomeStatus, UploadOutcome};
pub use row::{RowIndex, RowIndexError, RowRange};
