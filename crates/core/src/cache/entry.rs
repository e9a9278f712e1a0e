//! Cache entry and claim types.

use tokio::time::Instant;

/// A cached title for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub url: String,
    /// When the fetch was started, or when it completed once it has.
    pub fetched_at: Instant,
    /// Empty until the fetch completes, and also when the page had no title.
    pub title: String,
    pub in_flight: bool,
    /// Bumped every time a new fetch begins for this URL.
    pub generation: u64,
}

impl CacheEntry {
    pub(crate) fn begin(url: &str, now: Instant, generation: u64) -> Self {
        Self { url: url.to_string(), fetched_at: now, title: String::new(), in_flight: true, generation }
    }
}

/// Outcome of [`TitleCache::claim`](super::TitleCache::claim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A fresh title is cached; deliver it without fetching.
    Hit(String),
    /// Another fetch for this URL is still running.
    Pending,
    /// The caller owns a new fetch identified by this generation.
    Dispatch(u64),
}
