//! Video duration lookup.
//!
//! Links to a known video host get their duration appended to the title.
//!
//! ### Recognized links
//! - `youtu.be/<id>`
//! - `youtube.com/embed/<id>`, `youtube.com/v/<id>`
//! - `youtube.com/watch?...v=<id>` (the `v` parameter anywhere in the query)
//!
//! where `<id>` is 11 characters of `[-A-Za-z0-9_]`.
//!
//! ### Metadata endpoint
//! - Configurable template, `{video_id}` replaced by the ID.
//! - JSON response; see [`response`] for the fields read.
//!
//! The lookup is an enrichment: every failure means "no suffix".

pub mod error;
pub mod response;

pub use error::MetadataError;
pub use response::VideoFeed;

use async_trait::async_trait;
use linktitle_core::{AppConfig, Error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header;
use std::time::{Duration, Instant};

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        youtu(?:\.be/|be\.com/(?:embed/|v/|watch\?(?:.*?&)?v=))  # host and path
        \b([-\w]{11})\b                                            # video id
        ",
    )
    .expect("invalid video id pattern")
});

/// Extract the video ID from a recognized video link.
pub fn extract_video_id(url: &str) -> Option<&str> {
    let id = VIDEO_ID_RE.captures(url)?.get(1)?.as_str();
    id.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        .then_some(id)
}

/// Format seconds as `H:MM:SS`, dropping the hour part when it is zero.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = total_seconds / 60 % 60;
    let seconds = total_seconds % 60;

    if hours > 0 { format!("{}:{:02}:{:02}", hours, minutes, seconds) } else { format!("{}:{:02}", minutes, seconds) }
}

/// Source of video durations.
///
/// The orchestrator only knows this trait, so tests can answer without a network.
#[async_trait]
pub trait DurationSource: Send + Sync {
    /// Duration in seconds of the video with this ID.
    async fn duration_seconds(&self, video_id: &str) -> Result<u64, MetadataError>;
}

/// Look up the formatted duration for `url`, or `None` for unrecognized links
/// and failed lookups.
pub async fn lookup_duration(source: &dyn DurationSource, url: &str) -> Option<String> {
    let video_id = extract_video_id(url)?;
    match source.duration_seconds(video_id).await {
        Ok(seconds) => Some(format_duration(seconds)),
        Err(e) => {
            tracing::debug!("duration lookup for {} failed: {}", video_id, Error::from(e));
            None
        }
    }
}

/// Video metadata client configuration.
#[derive(Debug, Clone)]
pub struct DurationConfig {
    /// Endpoint template containing `{video_id}`.
    pub endpoint: String,
    /// Request timeout (default: 3s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl From<&AppConfig> for DurationConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.duration_endpoint.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// HTTP client for the video metadata endpoint.
#[derive(Debug, Clone)]
pub struct DurationClient {
    http: reqwest::Client,
    config: DurationConfig,
}

impl DurationClient {
    /// Create a new metadata client with the given configuration.
    pub fn new(config: DurationConfig) -> Result<Self, MetadataError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .build()?;

        Ok(Self { http, config })
    }

    /// Metadata URL for a video ID.
    pub fn endpoint_for(&self, video_id: &str) -> String {
        self.config.endpoint.replace(linktitle_core::config::VIDEO_ID_PLACEHOLDER, video_id)
    }
}

#[async_trait]
impl DurationSource for DurationClient {
    async fn duration_seconds(&self, video_id: &str) -> Result<u64, MetadataError> {
        let start = Instant::now();
        let url = self.endpoint_for(video_id);

        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let seconds = VideoFeed::from_slice(&bytes)?
            .duration_seconds()
            .ok_or(MetadataError::MissingDuration)?;

        tracing::debug!("duration for {} is {}s (looked up in {:?})", video_id, seconds, start.elapsed());

        Ok(seconds)
    }
}
