//! Google Sheets REST client.
//!
//! This crate provides:
//! - The `RowStore` seam: read one row, write one cell
//! - A Sheets v4 client implementing it over the values API
//! - Per-request retry budgets with randomized backoff
//! - Request metrics and tracing spans

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod types;

pub use client::{SheetsClient, SheetsConfig};
pub use error::{SheetsError, SheetsResult};
pub use retry::{RetryPolicy, SheetsRequest};
pub use store::RowStore;
pub use types::{CellRange, RawRow, ValueRange};
