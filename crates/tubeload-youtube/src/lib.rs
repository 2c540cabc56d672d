//! YouTube upload client.
//!
//! This crate provides:
//! - The `VideoHost` seam: upload a byte stream, get back a video id
//! - A YouTube Data v3 client using the resumable upload protocol
//! - Request types for the `videos.insert` resource

pub mod client;
pub mod error;
pub mod host;
pub mod types;

pub use client::{YouTubeClient, YouTubeConfig};
pub use error::{YouTubeError, YouTubeResult};
pub use host::{content_type_for, MediaSource, VideoHost};
pub use types::{InsertedVideo, PrivacyStatus, VideoResource, VideoSnippet, VideoStatus};
