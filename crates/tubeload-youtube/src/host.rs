//! Video host abstraction.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;

use crate::error::YouTubeResult;
use crate::types::VideoResource;

/// An opened media file ready to be streamed.
#[derive(Debug)]
pub struct MediaSource {
    pub file: File,
    pub len: u64,
    pub content_type: String,
}

impl MediaSource {
    /// Open `path` and read its length.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok(Self {
            file,
            len,
            content_type: content_type_for(path).to_string(),
        })
    }
}

/// Remote service that accepts a video and returns its id.
#[async_trait]
pub trait VideoHost: Send + Sync {
    async fn insert_video(&self, video: &VideoResource, media: MediaSource) -> YouTubeResult<String>;
}

/// MIME type for a media file, from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mpg") | Some("mpeg") => "video/mpeg",
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("out_2.mpg")), "video/mpeg");
        assert_eq!(content_type_for(Path::new("clip.MP4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_open_reads_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.webm");
        tokio::fs::write(&path, vec![0u8; 2048]).await.unwrap();

        let media = MediaSource::open(&path).await.unwrap();
        assert_eq!(media.len, 2048);
        assert_eq!(media.content_type, "video/webm");
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(MediaSource::open(dir.path().join("missing.mpg")).await.is_err());
    }
}
