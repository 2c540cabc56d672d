//! Fixed-size worker pool over a bounded row queue.
//!
//! The scheduler enqueues every row of the range once, closes the queue and
//! then waits for one completion signal per row. Workers share the queue
//! receiver behind an async mutex and exit when it is closed and drained.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tubeload_models::{OutcomeStatus, RowIndex, RowRange};

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::{RowPipeline, RowReport};

/// Aggregate of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub write_failures: usize,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &RowReport) {
        self.processed += 1;
        match report.outcome.status() {
            OutcomeStatus::Uploaded => self.uploaded += 1,
            OutcomeStatus::Failed => self.failed += 1,
        }
        if !report.written {
            self.write_failures += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} rows processed ({} uploaded, {} failed, {} unwritten)",
            self.processed, self.total, self.uploaded, self.failed, self.write_failures
        )
    }
}

/// Runs a range of rows through the pipeline with bounded concurrency.
pub struct WorkerPool {
    pipeline: Arc<RowPipeline>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(pipeline: RowPipeline, concurrency: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            concurrency: concurrency.max(1),
        }
    }

    /// Process every row of `range` exactly once.
    ///
    /// A fatal row error stops the remaining workers and is returned. If
    /// `cancel` fires first, workers stop taking rows and the result is
    /// `WorkerError::Cancelled` unless every row had already finished.
    pub async fn run_range(
        &self,
        range: RowRange,
        cancel: CancellationToken,
    ) -> WorkerResult<RunSummary> {
        let total = range.row_count();
        let run_cancel = cancel.child_token();

        info!(
            range = %range,
            rows = total,
            workers = self.concurrency,
            run_id = %self.pipeline.run_id(),
            "Starting run"
        );

        let (job_tx, job_rx) = mpsc::channel::<RowIndex>(total);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (done_tx, mut done_rx) = mpsc::channel::<WorkerResult<RowReport>>(total);

        let handles: Vec<_> = (0..self.concurrency)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    self.pipeline.clone(),
                    job_rx.clone(),
                    done_tx.clone(),
                    run_cancel.clone(),
                ))
            })
            .collect();
        // Workers hold the only senders, so `done_rx` closes once they all exit.
        drop(done_tx);

        for row in range.iter() {
            if job_tx.send(row).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut summary = RunSummary::new(total);
        let mut fatal: Option<WorkerError> = None;

        while let Some(result) = done_rx.recv().await {
            match result {
                Ok(report) => summary.record(&report),
                Err(e) => {
                    error!(error = %e, "Fatal row error, stopping run");
                    if fatal.is_none() {
                        run_cancel.cancel();
                        fatal = Some(e);
                    }
                }
            }
            if summary.is_complete() {
                break;
            }
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "Worker task panicked");
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }
        if !summary.is_complete() {
            warn!(summary = %summary, "Run cancelled");
            return Err(WorkerError::Cancelled {
                completed: summary.processed,
                total,
            });
        }

        info!(summary = %summary, "Run complete");
        Ok(summary)
    }
}

async fn worker_loop(
    worker_id: usize,
    pipeline: Arc<RowPipeline>,
    queue: Arc<Mutex<mpsc::Receiver<RowIndex>>>,
    done: mpsc::Sender<WorkerResult<RowReport>>,
    cancel: CancellationToken,
) {
    debug!(worker_id, "Worker started");

    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                row = rx.recv() => row,
            }
        };

        let Some(row) = next else {
            break;
        };

        let result = pipeline.run(row, &cancel).await;
        if result.is_err() {
            // Stop taking rows before the scheduler sees the error.
            cancel.cancel();
        }
        if done.send(result).await.is_err() {
            break;
        }
    }

    debug!(worker_id, "Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use crate::resolver::RowResolver;
    use crate::test_support::{sample_row, FakeHost, FakeStore};
    use crate::uploader::Uploader;
    use crate::writer::ResultWriter;
    use std::collections::HashSet;
    use std::time::Duration;
    use tempfile::TempDir;
    use tubeload_models::UploadOutcome;

    const BIG: usize = 1024 * 1024 + 1;

    struct Fixture {
        store: Arc<FakeStore>,
        host: Arc<FakeHost>,
        pool: WorkerPool,
        _dir: TempDir,
    }

    /// Rows `1..=rows`, each pointing at its own file; files listed in
    /// `small` are written below the size threshold.
    async fn fixture(rows: u32, concurrency: usize, small: &[u32], host: FakeHost) -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut store = FakeStore::new();
        for n in 1..=rows {
            let name = format!("out_{}.mpg", n);
            let len = if small.contains(&n) { 10 } else { BIG };
            tokio::fs::write(dir.path().join(&name), vec![0u8; len]).await.unwrap();
            store = store.with_row(n, sample_row(&name));
        }
        fixture_with_store(store, dir, concurrency, host)
    }

    fn fixture_with_store(
        store: FakeStore,
        dir: TempDir,
        concurrency: usize,
        host: FakeHost,
    ) -> Fixture {
        let store = Arc::new(store);
        let host = Arc::new(host);
        let pipeline = RowPipeline::new(
            RowResolver::new(store.clone(), dir.path()),
            Uploader::new(host.clone()),
            ResultWriter::new(store.clone(), "youtu.be"),
            &WorkerConfig::default(),
        );
        Fixture {
            store,
            host,
            pool: WorkerPool::new(pipeline, concurrency),
            _dir: dir,
        }
    }

    fn range(from: u32, to: u32) -> RowRange {
        RowRange::from_bounds(from, to).unwrap()
    }

    async fn assert_each_row_written_once(concurrency: usize) {
        let f = fixture(12, concurrency, &[], FakeHost::new()).await;

        let summary = f.pool.run_range(range(1, 12), CancellationToken::new()).await.unwrap();

        assert_eq!(summary.processed, 12);
        assert_eq!(summary.uploaded, 12);
        let writes = f.store.writes();
        assert_eq!(writes.len(), 12);
        let rows: HashSet<u32> = writes.iter().map(|(row, _)| row.get()).collect();
        assert_eq!(rows, (1..=12).collect::<HashSet<u32>>());
        assert_eq!(f.host.upload_count(), 12);
    }

    #[tokio::test]
    async fn test_single_worker_processes_every_row() {
        assert_each_row_written_once(1).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_three_workers_process_every_row() {
        assert_each_row_written_once(3).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ten_workers_process_every_row() {
        assert_each_row_written_once(10).await;
    }

    #[tokio::test]
    async fn test_more_workers_than_rows() {
        let f = fixture(2, 10, &[], FakeHost::new()).await;
        let summary = f.pool.run_range(range(1, 2), CancellationToken::new()).await.unwrap();
        assert_eq!(summary.processed, 2);
    }

    #[tokio::test]
    async fn test_sub_range_touches_only_its_rows() {
        let f = fixture(6, 3, &[], FakeHost::new()).await;

        f.pool.run_range(range(3, 5), CancellationToken::new()).await.unwrap();

        let mut rows: Vec<u32> = f.store.writes().iter().map(|(row, _)| row.get()).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_per_row_failures_do_not_abort() {
        let f = fixture(4, 2, &[2, 4], FakeHost::new()).await;

        let summary = f.pool.run_range(range(1, 4), CancellationToken::new()).await.unwrap();

        assert_eq!(summary.uploaded, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(f.store.writes().len(), 4);
    }

    #[tokio::test]
    async fn test_rerun_uploads_again() {
        let f = fixture(3, 2, &[], FakeHost::new()).await;

        f.pool.run_range(range(1, 3), CancellationToken::new()).await.unwrap();
        f.pool.run_range(range(1, 3), CancellationToken::new()).await.unwrap();

        assert_eq!(f.host.upload_count(), 6);
        assert_eq!(f.store.writes().len(), 6);
    }

    #[tokio::test]
    async fn test_unresolvable_row_aborts_run() {
        let dir = TempDir::new().unwrap();
        let mut store = FakeStore::new();
        for n in [1u32, 2, 4, 5] {
            let name = format!("out_{}.mpg", n);
            tokio::fs::write(dir.path().join(&name), vec![0u8; BIG]).await.unwrap();
            store = store.with_row(n, sample_row(&name));
        }
        let f = fixture_with_store(store, dir, 1, FakeHost::new());

        let err = f.pool.run_range(range(1, 5), CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, WorkerError::RemoteRead { row, .. } if row.get() == 3));
        // One worker takes rows in order, so nothing after row 3 is touched.
        let rows: Vec<u32> = f.store.writes().iter().map(|(row, _)| row.get()).collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unresolvable_row_cancels_sibling_workers() {
        let dir = TempDir::new().unwrap();
        let mut store = FakeStore::new();
        for n in (1u32..=9).filter(|n| *n != 5) {
            let name = format!("out_{}.mpg", n);
            tokio::fs::write(dir.path().join(&name), vec![0u8; BIG]).await.unwrap();
            store = store.with_row(n, sample_row(&name));
        }
        let host = FakeHost::new().with_delay(Duration::from_millis(200));
        let f = fixture_with_store(store, dir, 3, host);

        let err = f.pool.run_range(range(1, 9), CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, WorkerError::RemoteRead { row, .. } if row.get() == 5));

        let writes = f.store.writes();
        let rows: Vec<u32> = writes.iter().map(|(row, _)| row.get()).collect();
        let unique: HashSet<u32> = rows.iter().copied().collect();
        assert_eq!(unique.len(), rows.len(), "a row was written twice: {:?}", rows);
        assert!(rows.iter().all(|row| *row <= 6 && *row != 5), "{:?}", rows);

        for (row, value) in &writes {
            match row.get() {
                // The first wave finishes around when row 5 fails.
                1..=3 => assert!(
                    value.starts_with("https://youtu.be/vid-") || value == crate::pipeline::UPLOAD_CANCELLED,
                    "{}",
                    value
                ),
                _ => assert_eq!(value, crate::pipeline::UPLOAD_CANCELLED),
            }
        }
        // Row 4 was dequeued before row 5, so its upload was in flight.
        assert!(writes
            .iter()
            .any(|(row, value)| row.get() == 4 && value == crate::pipeline::UPLOAD_CANCELLED));
    }

    #[tokio::test]
    async fn test_external_cancellation_stops_run() {
        let f = fixture(6, 2, &[], FakeHost::new().with_delay(Duration::from_secs(30))).await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = f.pool.run_range(range(1, 6), cancel).await.unwrap_err();

        match err {
            WorkerError::Cancelled { completed, total } => {
                assert_eq!(total, 6);
                assert!(completed < 6);
            }
            other => panic!("expected cancellation, got {other}"),
        }
        // In-flight rows were still written back as cancelled.
        for (_, value) in f.store.writes() {
            assert_eq!(value, crate::pipeline::UPLOAD_CANCELLED);
        }
    }

    #[test]
    fn test_summary_display() {
        let mut summary = RunSummary::new(2);
        summary.record(&RowReport {
            row: RowIndex::new(1).unwrap(),
            outcome: UploadOutcome::success("a"),
            written: false,
        });
        assert_eq!(
            summary.to_string(),
            "1/2 rows processed (1 uploaded, 0 failed, 1 unwritten)"
        );
        assert!(!summary.is_complete());
    }
}
