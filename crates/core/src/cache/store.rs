//! Title cache operations.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::entry::{CacheEntry, Claim};

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, CacheEntry>,
    next_generation: u64,
}

impl State {
    fn begin(&mut self, url: &str, now: Instant) -> CacheEntry {
        self.next_generation += 1;
        let entry = CacheEntry::begin(url, now, self.next_generation);
        self.entries.insert(url.to_string(), entry.clone());
        entry
    }
}

/// URL -> title cache shared by every channel.
///
/// All access goes through one async mutex; it is never held across network I/O.
#[derive(Debug)]
pub struct TitleCache {
    state: Mutex<State>,
    lifetime: Duration,
}

impl TitleCache {
    /// Create an empty cache whose entries expire after `lifetime`.
    pub fn new(lifetime: Duration) -> Self {
        Self { state: Mutex::new(State::default()), lifetime }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Get a copy of the entry for `url`, stale or not.
    pub async fn lookup(&self, url: &str) -> Option<CacheEntry> {
        self.state.lock().await.entries.get(url).cloned()
    }

    /// True iff `now - fetched_at <= lifetime`.
    pub fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.fetched_at) <= self.lifetime
    }

    /// Create or overwrite the entry for `url` as an in-flight fetch.
    pub async fn begin_fetch(&self, url: &str, now: Instant) -> CacheEntry {
        self.state.lock().await.begin(url, now)
    }

    /// Decide what a new sighting of `url` should do, beginning a fetch when needed.
    ///
    /// Check and begin happen under one lock so two sightings racing each other
    /// cannot both dispatch.
    pub async fn claim(&self, url: &str, now: Instant) -> Claim {
        let mut state = self.state.lock().await;

        if let Some(entry) = state.entries.get(url)
            && self.is_fresh(entry, now)
        {
            return if entry.in_flight { Claim::Pending } else { Claim::Hit(entry.title.clone()) };
        }

        Claim::Dispatch(state.begin(url, now).generation)
    }

    /// Store the title of a finished fetch.
    ///
    /// Returns false and leaves the cache untouched when `generation` is not the
    /// entry's current generation; the result belongs to a superseded fetch.
    pub async fn complete(&self, url: &str, generation: u64, title: &str, now: Instant) -> bool {
        let mut state = self.state.lock().await;
        match state.entries.get_mut(url) {
            Some(entry) if entry.generation == generation => {
                entry.title = title.to_string();
                entry.fetched_at = now;
                entry.in_flight = false;
                true
            }
            _ => {
                tracing::debug!(url, generation, "discarding stale completion");
                false
            }
        }
    }

    /// Drop the entry of a fetch that failed before any response arrived, so
    /// the next sighting retries.
    pub async fn abandon(&self, url: &str, generation: u64) -> bool {
        let mut state = self.state.lock().await;
        if state.entries.get(url).is_some_and(|e| e.generation == generation) {
            state.entries.remove(url);
            true
        } else {
            false
        }
    }

    /// Remove settled entries that are no longer fresh. Returns how many were dropped.
    ///
    /// In-flight entries stay until their fetch completes or is abandoned.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        let lifetime = self.lifetime;
        state
            .entries
            .retain(|_, entry| entry.in_flight || now.saturating_duration_since(entry.fetched_at) <= lifetime);
        before - state.entries.len()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFETIME: Duration = Duration::from_secs(6 * 60 * 60);

    #[tokio::test]
    async fn test_lookup_missing() {
        let cache = TitleCache::new(LIFETIME);
        assert!(cache.lookup("https://example.com").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_begin_fetch_creates_in_flight_entry() {
        let cache = TitleCache::new(LIFETIME);
        let now = Instant::now();
        let entry = cache.begin_fetch("https://example.com", now).await;

        assert_eq!(entry.url, "https://example.com");
        assert!(entry.title.is_empty());
        assert!(entry.in_flight);
        assert_eq!(entry.fetched_at, now);
        assert_eq!(cache.lookup("https://example.com").await, Some(entry));
    }

    #[tokio::test]
    async fn test_is_fresh_boundary() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();
        let entry = cache.begin_fetch("https://example.com", start).await;

        assert!(cache.is_fresh(&entry, start));
        assert!(cache.is_fresh(&entry, start + LIFETIME));
        assert!(!cache.is_fresh(&entry, start + LIFETIME + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_complete_stores_title() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();
        let entry = cache.begin_fetch("https://example.com", start).await;
        let done = start + Duration::from_millis(250);

        assert!(cache.complete("https://example.com", entry.generation, "Example Domain", done).await);

        let stored = cache.lookup("https://example.com").await.unwrap();
        assert_eq!(stored.title, "Example Domain");
        assert!(!stored.in_flight);
        assert_eq!(stored.fetched_at, done);
    }

    #[tokio::test]
    async fn test_complete_rejects_stale_generation() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();
        let old = cache.begin_fetch("https://example.com", start).await;
        let new = cache.begin_fetch("https://example.com", start).await;
        assert_ne!(old.generation, new.generation);

        assert!(!cache.complete("https://example.com", old.generation, "Old", start).await);
        assert!(cache.lookup("https://example.com").await.unwrap().in_flight);

        assert!(cache.complete("https://example.com", new.generation, "New", start).await);
        assert_eq!(cache.lookup("https://example.com").await.unwrap().title, "New");
    }

    #[tokio::test]
    async fn test_complete_unknown_url() {
        let cache = TitleCache::new(LIFETIME);
        assert!(!cache.complete("https://example.com", 1, "Title", Instant::now()).await);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_claim_sequence() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();

        let generation = match cache.claim("https://example.com", start).await {
            Claim::Dispatch(generation) => generation,
            other => panic!("expected dispatch, got {other:?}"),
        };
        assert_eq!(cache.claim("https://example.com", start).await, Claim::Pending);

        cache.complete("https://example.com", generation, "Example", start).await;
        assert_eq!(cache.claim("https://example.com", start).await, Claim::Hit("Example".into()));
    }

    #[tokio::test]
    async fn test_claim_refetches_after_lifetime() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();

        let Claim::Dispatch(first) = cache.claim("https://example.com", start).await else {
            panic!("expected dispatch");
        };
        cache.complete("https://example.com", first, "Example", start).await;

        let later = start + LIFETIME + Duration::from_secs(1);
        let Claim::Dispatch(second) = cache.claim("https://example.com", later).await else {
            panic!("expected dispatch after expiry");
        };
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_claim_supersedes_stuck_in_flight() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();
        cache.claim("https://example.com", start).await;

        let later = start + LIFETIME + Duration::from_secs(1);
        assert!(matches!(cache.claim("https://example.com", later).await, Claim::Dispatch(_)));
    }

    #[tokio::test]
    async fn test_empty_title_is_cached() {
        let cache = TitleCache::new(LIFETIME);
        let now = Instant::now();
        let Claim::Dispatch(generation) = cache.claim("https://example.com/404", now).await else {
            panic!("expected dispatch");
        };
        cache.complete("https://example.com/404", generation, "", now).await;
        assert_eq!(cache.claim("https://example.com/404", now).await, Claim::Hit(String::new()));
    }

    #[tokio::test]
    async fn test_abandon_allows_retry() {
        let cache = TitleCache::new(LIFETIME);
        let now = Instant::now();
        let Claim::Dispatch(generation) = cache.claim("https://example.com", now).await else {
            panic!("expected dispatch");
        };

        assert!(!cache.abandon("https://example.com", generation + 1).await);
        assert!(cache.abandon("https://example.com", generation).await);
        assert!(matches!(cache.claim("https://example.com", now).await, Claim::Dispatch(_)));
    }

    #[tokio::test]
    async fn test_sweep_removes_stale_entries() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();
        let old = cache.begin_fetch("https://old.example", start).await;
        cache.complete("https://old.example", old.generation, "Old", start).await;

        let later = start + LIFETIME + Duration::from_secs(10);
        cache.begin_fetch("https://new.example", later).await;

        assert_eq!(cache.sweep(later).await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.lookup("https://old.example").await.is_none());
        assert!(cache.lookup("https://new.example").await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_keeps_in_flight_entries() {
        let cache = TitleCache::new(LIFETIME);
        let start = Instant::now();
        let pending = cache.begin_fetch("https://slow.example", start).await;

        assert_eq!(cache.sweep(start + LIFETIME * 2).await, 0);
        assert!(cache.complete("https://slow.example", pending.generation, "Slow", start).await);
    }
}
