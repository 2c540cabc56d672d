//! Batch upload worker.
//!
//! This crate provides:
//! - Per-row steps: row resolution, size gate, upload, result write-back
//! - `RowPipeline`, which turns every per-row failure into a written outcome
//! - `WorkerPool`, a fixed set of workers draining a bounded row queue
//! - Credential bootstrap and structured logging for the `tubeload` binary

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod pool;
pub mod resolver;
pub mod size_gate;
pub mod uploader;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{GoogleConfig, WorkerConfig};
pub use credentials::authorize;
pub use error::{WorkerError, WorkerResult};
pub use logging::RowLogger;
pub use pipeline::{RowPipeline, RowReport};
pub use pool::{RunSummary, WorkerPool};
pub use resolver::RowResolver;
pub use size_gate::SizeGate;
pub use uploader::Uploader;
pub use writer::ResultWriter;
