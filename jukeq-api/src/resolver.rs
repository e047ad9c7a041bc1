//! Video metadata resolution
//!
//! The submission path depends on one capability: turn a URL into a
//! `{title, video_id}` pair or fail. It is a trait so tests (and alternative
//! deployments) substitute their own implementation; the shipped one asks
//! YouTube's keyless oEmbed endpoint for the title.

use async_trait::async_trait;
use jukeq_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Resolved video metadata
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub title: String,
    pub video_id: String,
}

/// Capability to resolve a video URL into metadata
#[async_trait]
pub trait VideoResolver: Send + Sync {
    /// Resolve `url`, bounded by the implementation's timeout
    ///
    /// Fails with `InvalidInput` for URLs that are not video references and
    /// `Upstream` when the lookup fails or times out.
    async fn resolve(&self, url: &str) -> Result<VideoInfo>;
}

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .unwrap()
});

/// Extract the 11-character video id from the common YouTube URL shapes
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .map(|captures| captures[1].to_string())
}

/// Resolver backed by YouTube's oEmbed endpoint
///
/// oEmbed needs no API key and returns the video title, which is all the
/// submission path consumes.
#[derive(Clone)]
pub struct OEmbedResolver {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
}

impl OEmbedResolver {
    /// Create a resolver whose lookups are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VideoResolver for OEmbedResolver {
    async fn resolve(&self, url: &str) -> Result<VideoInfo> {
        let video_id = extract_video_id(url).ok_or_else(|| {
            Error::InvalidInput("not a recognizable YouTube video URL".to_string())
        })?;

        let endpoint = format!(
            "https://www.youtube.com/oembed?url=https://www.youtube.com/watch?v={}&format=json",
            video_id
        );

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("video lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "video lookup returned {}",
                response.status()
            )));
        }

        let body: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("malformed video metadata: {}", e)))?;

        debug!(video_id, title = %body.title, "resolved video metadata");
        Ok(VideoInfo {
            title: body.title,
            video_id,
        })
    }
}
