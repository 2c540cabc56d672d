//! Row to job resolution.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tubeload_models::{job::DEFAULT_CATEGORY_ID, JobDescriptor, RowIndex};
use tubeload_sheets::RowStore;

use crate::error::{WorkerError, WorkerResult};

// Zero-based positions within the `A:J` span.
const COL_TITLE_DATE: usize = 1;
const COL_KEYWORDS: usize = 2;
const COL_TITLE_NAME: usize = 3;
const COL_SOURCE: usize = 6;
const COL_CLIP_START: usize = 7;
const COL_CLIP_END: usize = 8;
const COL_OUTPUT_FILE: usize = 9;

/// Reads one row and maps its cells onto a `JobDescriptor`.
#[derive(Clone)]
pub struct RowResolver {
    store: Arc<dyn RowStore>,
    base_dir: PathBuf,
}

impl RowResolver {
    pub fn new(store: Arc<dyn RowStore>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            base_dir: base_dir.into(),
        }
    }

    pub async fn resolve(&self, row: RowIndex) -> WorkerResult<JobDescriptor> {
        let rows = self
            .store
            .read_row(row)
            .await
            .map_err(|e| WorkerError::remote_read(row, e.to_string()))?;

        let cells = match rows.as_slice() {
            [cells] => cells,
            other => {
                return Err(WorkerError::remote_read(
                    row,
                    format!("expected exactly one row, got {}", other.len()),
                ))
            }
        };

        let output_file = text_cell(row, cells, COL_OUTPUT_FILE)?;

        Ok(JobDescriptor {
            file_path: self.base_dir.join(output_file),
            title: format!(
                "{} {}",
                text_cell(row, cells, COL_TITLE_DATE)?,
                text_cell(row, cells, COL_TITLE_NAME)?
            ),
            description: format!(
                "{}: {}-{}",
                text_cell(row, cells, COL_SOURCE)?,
                text_cell(row, cells, COL_CLIP_START)?,
                text_cell(row, cells, COL_CLIP_END)?
            ),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            keywords: JobDescriptor::parse_keywords(text_cell(row, cells, COL_KEYWORDS)?),
        })
    }
}

fn text_cell(row: RowIndex, cells: &[Value], index: usize) -> WorkerResult<&str> {
    match cells.get(index) {
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(other) => Err(WorkerError::malformed_row(
            row,
            format!("column {} is not text: {}", column_label(index), other),
        )),
        None => Err(WorkerError::malformed_row(
            row,
            format!("column {} is missing", column_label(index)),
        )),
    }
}

fn column_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_row, FakeStore};
    use std::path::Path;

    fn row(n: u32) -> RowIndex {
        RowIndex::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_sample_row() {
        let store = Arc::new(FakeStore::new().with_row(5, sample_row("out_2.mpg")));
        let resolver = RowResolver::new(store, "apu");

        let job = resolver.resolve(row(5)).await.unwrap();

        assert_eq!(job.file_path, Path::new("apu/out_2.mpg"));
        assert_eq!(job.title, "1997.06.07 BEAC 97");
        assert_eq!(job.description, "apu/Kicsi_40.mpg: 0:01.09-4:55.08");
        assert_eq!(job.category_id, "22");
        assert_eq!(job.keywords, vec!["beac"]);
    }

    #[tokio::test]
    async fn test_missing_row_is_remote_read() {
        let resolver = RowResolver::new(Arc::new(FakeStore::new()), "apu");
        let err = resolver.resolve(row(3)).await.unwrap_err();
        assert!(matches!(err, WorkerError::RemoteRead { .. }));
    }

    #[tokio::test]
    async fn test_two_rows_is_remote_read() {
        let store = FakeStore::new()
            .with_rows(3, vec![sample_row("a.mpg"), sample_row("b.mpg")]);
        let resolver = RowResolver::new(Arc::new(store), "apu");
        let err = resolver.resolve(row(3)).await.unwrap_err();
        assert!(matches!(err, WorkerError::RemoteRead { .. }));
    }

    #[tokio::test]
    async fn test_short_row_is_malformed() {
        let mut cells = sample_row("out.mpg");
        cells.truncate(9);
        let resolver = RowResolver::new(Arc::new(FakeStore::new().with_row(2, cells)), "apu");

        let err = resolver.resolve(row(2)).await.unwrap_err();
        assert!(matches!(err, WorkerError::MalformedRow { ref reason, .. } if reason.contains("column J")));
    }

    #[tokio::test]
    async fn test_non_text_cell_is_malformed() {
        let mut cells = sample_row("out.mpg");
        cells[COL_KEYWORDS] = serde_json::json!(40);
        let resolver = RowResolver::new(Arc::new(FakeStore::new().with_row(2, cells)), "apu");

        let err = resolver.resolve(row(2)).await.unwrap_err();
        assert!(matches!(err, WorkerError::MalformedRow { .. }));
    }

    #[tokio::test]
    async fn test_blank_keywords_yield_no_tags() {
        let mut cells = sample_row("out.mpg");
        cells[COL_KEYWORDS] = serde_json::json!(" ");
        let resolver = RowResolver::new(Arc::new(FakeStore::new().with_row(2, cells)), "apu");

        assert!(resolver.resolve(row(2)).await.unwrap().keywords.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_remote_read() {
        let store = FakeStore::new().failing_reads();
        let resolver = RowResolver::new(Arc::new(store), "apu");
        let err = resolver.resolve(row(1)).await.unwrap_err();
        assert!(matches!(err, WorkerError::RemoteRead { .. }));
    }

    #[test]
    fn test_column_labels() {
        assert_eq!(column_label(0), 'A');
        assert_eq!(column_label(COL_OUTPUT_FILE), 'J');
    }
}
