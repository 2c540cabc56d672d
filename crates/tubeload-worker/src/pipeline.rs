//! Per-row pipeline: resolve, gate, upload, write back.
//!
//! Only a resolution failure escapes as an error. Every other per-row
//! failure becomes a `Failure` outcome that is written to the row like any
//! success, so the sheet always explains what happened.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tubeload_models::{JobDescriptor, RowIndex, UploadOutcome};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::RowLogger;
use crate::metrics::{record_row, record_write_failure};
use crate::resolver::RowResolver;
use crate::size_gate::SizeGate;
use crate::uploader::Uploader;
use crate::writer::ResultWriter;

pub const FILE_TOO_SMALL: &str = "file too small, likely export error";
pub const UPLOAD_CANCELLED: &str = "upload cancelled";

/// What happened to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub row: RowIndex,
    pub outcome: UploadOutcome,
    /// False when the write-back failed and the failure was tolerated
    pub written: bool,
}

/// Runs one row from resolution to write-back.
#[derive(Clone)]
pub struct RowPipeline {
    resolver: RowResolver,
    gate: SizeGate,
    uploader: Uploader,
    writer: ResultWriter,
    upload_timeout: Duration,
    write_timeout: Duration,
    abort_on_write_failure: bool,
    run_id: String,
}

impl RowPipeline {
    pub fn new(
        resolver: RowResolver,
        uploader: Uploader,
        writer: ResultWriter,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            resolver,
            gate: SizeGate::new(config.min_file_size),
            uploader,
            writer,
            upload_timeout: config.upload_timeout,
            write_timeout: config.write_timeout,
            abort_on_write_failure: config.abort_on_write_failure,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Process `row`. Cancelling `cancel` fails an in-flight upload, whose
    /// outcome is still written back.
    pub async fn run(&self, row: RowIndex, cancel: &CancellationToken) -> WorkerResult<RowReport> {
        let logger = RowLogger::new(row, &self.run_id);
        let span = logger.create_span();

        async {
            let start = Instant::now();

            let job = self.resolver.resolve(row).await?;
            logger.log_start(&job.file_path.display().to_string());

            let outcome = self.gate_and_upload(&job, cancel, &logger).await;
            if let UploadOutcome::Failure { reason } = &outcome {
                logger.log_warning(reason);
            }

            let written = self.write_back(row, &outcome, &logger).await?;

            record_row(outcome.status(), start.elapsed());
            logger.log_done(outcome.status().as_str());

            Ok::<_, WorkerError>(RowReport {
                row,
                outcome,
                written,
            })
        }
        .instrument(span)
        .await
    }

    async fn gate_and_upload(
        &self,
        job: &JobDescriptor,
        cancel: &CancellationToken,
        logger: &RowLogger,
    ) -> UploadOutcome {
        match self.gate.check(&job.file_path).await {
            Ok(true) => {}
            Ok(false) => return UploadOutcome::failure(FILE_TOO_SMALL),
            Err(e) => return UploadOutcome::failure(format!("open {}: {}", job.file_path.display(), e)),
        }

        logger.log_progress("uploading");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => UploadOutcome::failure(UPLOAD_CANCELLED),
            result = tokio::time::timeout(self.upload_timeout, self.uploader.upload(job)) => {
                result.unwrap_or_else(|_| {
                    UploadOutcome::failure(format!("upload timed out after {:?}", self.upload_timeout))
                })
            }
        }
    }

    /// Returns whether the outcome reached the sheet.
    async fn write_back(
        &self,
        row: RowIndex,
        outcome: &UploadOutcome,
        logger: &RowLogger,
    ) -> WorkerResult<bool> {
        let result = match tokio::time::timeout(self.write_timeout, self.writer.write(row, outcome)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::remote_write(
                row,
                format!("write timed out after {:?}", self.write_timeout),
            )),
        };

        match result {
            Ok(()) => Ok(true),
            Err(e) if self.abort_on_write_failure => Err(e),
            Err(e) => {
                logger.log_error(&e.to_string());
                record_write_failure();
                Ok(false)
            }
        }
    }
}
