//! In-memory fakes for the row store and video host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tubeload_models::RowIndex;
use tubeload_sheets::{RawRow, RowStore, SheetsError, SheetsResult};
use tubeload_youtube::{MediaSource, VideoHost, VideoResource, YouTubeError, YouTubeResult};

/// The example row used throughout the tests, with a custom output file.
pub fn sample_row(output_file: &str) -> RawRow {
    [
        "40",
        "1997.06.07",
        "beac",
        "BEAC 97",
        "0:01:09",
        "4:55:08",
        "apu/Kicsi_40.mpg",
        "0:01.09",
        "4:55.08",
        output_file,
    ]
    .iter()
    .map(|s| serde_json::Value::String(s.to_string()))
    .collect()
}

/// Row store backed by a map; records every write.
#[derive(Default)]
pub struct FakeStore {
    rows: HashMap<u32, Vec<RawRow>>,
    writes: Mutex<Vec<(RowIndex, String)>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(self, row: u32, cells: RawRow) -> Self {
        self.with_rows(row, vec![cells])
    }

    pub fn with_rows(mut self, row: u32, rows: Vec<RawRow>) -> Self {
        self.rows.insert(row, rows);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn writes(&self) -> Vec<(RowIndex, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowStore for FakeStore {
    async fn read_row(&self, row: RowIndex) -> SheetsResult<Vec<RawRow>> {
        if self.fail_reads {
            return Err(SheetsError::ServerError(503, "backend unavailable".to_string()));
        }
        Ok(self.rows.get(&row.get()).cloned().unwrap_or_default())
    }

    async fn write_cell(&self, row: RowIndex, value: &str) -> SheetsResult<()> {
        if self.fail_writes {
            return Err(SheetsError::PermissionDenied("read-only sheet".to_string()));
        }
        self.writes.lock().unwrap().push((row, value.to_string()));
        Ok(())
    }
}

/// Video host handing out `vid-1`, `vid-2`, ...
#[derive(Default)]
pub struct FakeHost {
    uploads: AtomicUsize,
    videos: Mutex<Vec<VideoResource>>,
    error: Option<String>,
    delay: Option<Duration>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn videos(&self) -> Vec<VideoResource> {
        self.videos.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoHost for FakeHost {
    async fn insert_video(&self, video: &VideoResource, _media: MediaSource) -> YouTubeResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.error {
            return Err(YouTubeError::Forbidden(message.clone()));
        }
        self.videos.lock().unwrap().push(video.clone());
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("vid-{}", n))
    }
}
