//! Job description for a single row.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// YouTube category code used for every upload ("People & Blogs").
pub const DEFAULT_CATEGORY_ID: &str = "22";

/// Everything needed to upload the media file referenced by one row.
///
/// Built once from the raw row and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Local media file, the output filename joined with the base directory
    pub file_path: PathBuf,
    pub title: String,
    pub description: String,
    pub category_id: String,
    /// Ordered tags, possibly empty
    pub keywords: Vec<String>,
}

impl JobDescriptor {
    /// Split a raw keywords cell into tags.
    ///
    /// Tags are comma separated; surrounding whitespace is trimmed and empty
    /// entries are dropped, so a blank cell yields no tags at all.
    pub fn parse_keywords(raw: &str) -> Vec<String> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        raw.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Tags to attach to the upload, or `None` when there are none.
    pub fn tags(&self) -> Option<Vec<String>> {
        if self.keywords.is_empty() {
            None
        } else {
            Some(self.keywords.clone())
        }
    }
}
