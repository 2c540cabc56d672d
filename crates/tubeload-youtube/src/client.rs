//! YouTube Data v3 client.
//!
//! Uploads go through the resumable protocol: metadata is POSTed to open a
//! session, then the file is streamed to the session URI in one PUT.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, info_span, Instrument};
use tubeload_auth::TokenCache;
use url::Url;

use crate::error::{YouTubeError, YouTubeResult};
use crate::host::{MediaSource, VideoHost};
use crate::types::{InsertedVideo, PrivacyStatus, VideoResource};

const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com";

/// YouTube client configuration.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// API root, overridable for tests
    pub base_url: String,
    /// Visibility given to new uploads
    pub privacy_status: PrivacyStatus,
    /// Host used to build the shareable locator
    pub locator_host: String,
    /// Connect timeout; total duration is bounded by the caller
    pub connect_timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: YOUTUBE_BASE_URL.to_string(),
            privacy_status: PrivacyStatus::Private,
            locator_host: "youtu.be".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl YouTubeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> YouTubeResult<Self> {
        let defaults = Self::default();

        let privacy_status = match std::env::var("TUBELOAD_PRIVACY_STATUS") {
            Ok(raw) => raw.parse().map_err(YouTubeError::Config)?,
            Err(_) => defaults.privacy_status,
        };

        let connect_timeout_secs: u64 = std::env::var("YOUTUBE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            base_url: std::env::var("YOUTUBE_BASE_URL").unwrap_or(defaults.base_url),
            privacy_status,
            locator_host: std::env::var("TUBELOAD_LOCATOR_HOST").unwrap_or(defaults.locator_host),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

/// YouTube upload client.
#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
    config: YouTubeConfig,
    tokens: Arc<TokenCache>,
}

impl YouTubeClient {
    pub fn new(config: YouTubeConfig, tokens: Arc<TokenCache>) -> YouTubeResult<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| YouTubeError::config(format!("invalid base url: {}", e)))?;

        // No total timeout: a large upload can legitimately run for an hour.
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("tubeload-youtube/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(YouTubeError::Network)?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn config(&self) -> &YouTubeConfig {
        &self.config
    }

    fn session_url(&self) -> YouTubeResult<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| YouTubeError::config(format!("invalid base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| YouTubeError::config("base url cannot be a base"))?
            .pop_if_empty()
            .extend(["upload", "youtube", "v3", "videos"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("part", "snippet,status");
        Ok(url)
    }

    /// Open a resumable upload session and return its URI.
    async fn open_session(&self, video: &VideoResource, media: &MediaSource) -> YouTubeResult<Url> {
        let url = self.session_url()?;

        let response = self
            .send_authorized(|token| {
                self.http
                    .post(url.clone())
                    .bearer_auth(token)
                    .header("X-Upload-Content-Length", media.len)
                    .header("X-Upload-Content-Type", media.content_type.as_str())
                    .json(video)
            })
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(YouTubeError::MissingUploadLocation)?;

        // Relative locations resolve against the session endpoint.
        url.join(location)
            .map_err(|e| YouTubeError::InvalidResponse(format!("bad upload location: {}", e)))
    }

    /// Stream the file body to an open session.
    async fn send_media(&self, session: Url, media: MediaSource) -> YouTubeResult<InsertedVideo> {
        let token = self.tokens.get_token().await?;
        let len = media.len;

        let response = self
            .http
            .put(session)
            .bearer_auth(token)
            .header(CONTENT_LENGTH, len)
            .header(CONTENT_TYPE, media.content_type.as_str())
            .body(Body::wrap_stream(ReaderStream::new(media.file)))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let inserted: InsertedVideo = response.json().await?;
                if inserted.id.is_empty() {
                    return Err(YouTubeError::InvalidResponse("video id is empty".to_string()));
                }
                Ok(inserted)
            }
            _ => Err(Self::handle_error_response(response).await),
        }
    }

    /// Send with a bearer token, re-authenticating once on 401.
    async fn send_authorized<F>(&self, build: F) -> YouTubeResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.tokens.get_token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Upload session rejected token, refreshing");
        self.tokens.invalidate().await;
        let token = self.tokens.get_token().await?;
        Ok(build(&token).send().await?)
    }

    async fn handle_error_response(response: Response) -> YouTubeError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        YouTubeError::from_http_status(status, body)
    }
}

#[async_trait]
impl VideoHost for YouTubeClient {
    async fn insert_video(&self, video: &VideoResource, media: MediaSource) -> YouTubeResult<String> {
        let span = info_span!("youtube_upload", title = %video.snippet.title, bytes = media.len);

        async {
            let session = self.open_session(video, &media).await?;
            debug!(session = %session, "Opened upload session");

            let inserted = self.send_media(session, media).await?;
            info!(video_id = %inserted.id, "Upload complete");
            Ok::<_, YouTubeError>(inserted.id)
        }
        .instrument(span)
        .await
    }
}
