//! Media upload step.

use std::sync::Arc;

use tracing::debug;
use tubeload_models::{JobDescriptor, UploadOutcome};
use tubeload_youtube::{MediaSource, PrivacyStatus, VideoHost, VideoResource, VideoSnippet, VideoStatus};

/// Streams a job's file to the video host.
#[derive(Clone)]
pub struct Uploader {
    host: Arc<dyn VideoHost>,
    privacy_status: PrivacyStatus,
}

impl Uploader {
    pub fn new(host: Arc<dyn VideoHost>) -> Self {
        Self {
            host,
            privacy_status: PrivacyStatus::Private,
        }
    }

    pub fn with_privacy_status(mut self, privacy_status: PrivacyStatus) -> Self {
        self.privacy_status = privacy_status;
        self
    }

    /// Metadata for the "create video" call.
    pub fn video_resource(&self, job: &JobDescriptor) -> VideoResource {
        VideoResource {
            snippet: VideoSnippet {
                title: job.title.clone(),
                description: job.description.clone(),
                category_id: job.category_id.clone(),
                tags: job.tags(),
            },
            status: VideoStatus {
                privacy_status: self.privacy_status,
            },
        }
    }

    /// Upload the job's file. Never fails; errors become a `Failure` outcome.
    pub async fn upload(&self, job: &JobDescriptor) -> UploadOutcome {
        let media = match MediaSource::open(&job.file_path).await {
            Ok(media) => media,
            Err(e) => return UploadOutcome::failure(e.to_string()),
        };
        debug!(path = %job.file_path.display(), bytes = media.len, "Uploading media");

        match self.host.insert_video(&self.video_resource(job), media).await {
            Ok(id) => UploadOutcome::success(id),
            Err(e) => UploadOutcome::failure(e.to_string()),
        }
    }
}
