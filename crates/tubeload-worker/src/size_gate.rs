//! Pre-upload size heuristic.

use std::io;
use std::path::Path;

use tokio::fs::File;

use crate::config::DEFAULT_MIN_FILE_SIZE;

/// Rejects files too small to be a real export.
#[derive(Debug, Clone, Copy)]
pub struct SizeGate {
    threshold: u64,
}

impl Default for SizeGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FILE_SIZE)
    }
}

impl SizeGate {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    /// `Ok(true)` when the file is strictly larger than the threshold.
    ///
    /// Open and stat errors are returned as-is so callers can tell a missing
    /// file from a small one.
    pub async fn check(&self, path: impl AsRef<Path>) -> io::Result<bool> {
        let file = File::open(path.as_ref()).await?;
        let len = file.metadata().await?.len();
        Ok(len > self.threshold)
    }
}
