//! Video metadata response types.
//!
//! The endpoint answers with a JSON feed entry; only the duration is read:
//! `entry.media$group.yt$duration.seconds`, given as a string or a number.

use serde::Deserialize;

use super::error::MetadataError;

/// Raw metadata document.
#[derive(Debug, Deserialize)]
pub struct VideoFeed {
    pub entry: Option<VideoEntry>,
}

/// Single video entry.
#[derive(Debug, Deserialize)]
pub struct VideoEntry {
    #[serde(rename = "media$group")]
    pub media_group: Option<MediaGroup>,
}

/// Media group of an entry.
#[derive(Debug, Deserialize)]
pub struct MediaGroup {
    #[serde(rename = "yt$duration")]
    pub duration: Option<DurationField>,
}

/// Duration node.
#[derive(Debug, Deserialize)]
pub struct DurationField {
    pub seconds: Seconds,
}

/// Seconds as they appear on the wire.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Seconds {
    Number(u64),
    Text(String),
}

impl Seconds {
    fn value(&self) -> Option<u64> {
        match self {
            Seconds::Number(n) => Some(*n),
            Seconds::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl VideoFeed {
    /// Parse a metadata document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        serde_json::from_slice(bytes).map_err(|e| MetadataError::Parse(e.to_string()))
    }

    /// Duration of the video in seconds, if the document carries one.
    pub fn duration_seconds(&self) -> Option<u64> {
        self.entry
            .as_ref()?
            .media_group
            .as_ref()?
            .duration
            .as_ref()?
            .seconds
            .value()
    }
}
