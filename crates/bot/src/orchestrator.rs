//! Link orchestration.
//!
//! Scans incoming messages for links, answers from the cache when it can and
//! otherwise dispatches a background fetch. Completion runs the title pipeline,
//! settles the cache entry and prints the result into the originating channel.

use std::sync::Arc;

use linktitle_client::extract::TitleOutput;
use linktitle_client::video::{DurationSource, extract_video_id, lookup_duration};
use linktitle_client::{Dispatcher, FetchResult, Fetcher, title_from_fetch};
use linktitle_core::{AppConfig, Claim, Error, TitleCache};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::host::Host;

static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)https?://[^\s<>"]+"#).expect("invalid link pattern"));

/// Find http(s) links in a message, in order of appearance.
pub fn scan_links(text: &str) -> Vec<&str> {
    LINK_RE.find_iter(text).map(|m| m.as_str()).collect()
}

struct Inner {
    cache: TitleCache,
    dispatcher: Dispatcher,
    durations: Option<Arc<dyn DurationSource>>,
    host: Arc<dyn Host>,
    config: AppConfig,
}

/// Drives link titles from message to output. Cheap to clone.
#[derive(Clone)]
pub struct LinkOrchestrator {
    inner: Arc<Inner>,
}

impl LinkOrchestrator {
    pub fn new(
        config: &AppConfig, fetcher: Arc<dyn Fetcher>, durations: Option<Arc<dyn DurationSource>>, host: Arc<dyn Host>,
    ) -> Self {
        let inner = Inner {
            cache: TitleCache::new(config.cache_lifetime()),
            dispatcher: Dispatcher::new(fetcher, config.timeout()),
            durations,
            host,
            config: config.clone(),
        };
        Self { inner: Arc::new(inner) }
    }

    pub fn cache(&self) -> &TitleCache {
        &self.inner.cache
    }

    /// Entry point for the host's message hook.
    ///
    /// Our own output and system channels are ignored.
    pub async fn on_incoming_message(&self, channel: &str, text: &str, is_own_output: bool) {
        if is_own_output || self.inner.config.is_system_channel(channel) {
            return;
        }
        self.handle_message(channel, text).await;
    }

    /// Look up or fetch the title of every link in `text`.
    ///
    /// Any message starting with the output prefix counts as our own output and
    /// is skipped, including one typed by a user.
    pub async fn handle_message(&self, channel: &str, text: &str) {
        if text.trim_start().starts_with(&self.inner.config.output_prefix) {
            return;
        }

        for url in scan_links(text) {
            self.handle_link(channel, url).await;
        }
    }

    async fn handle_link(&self, channel: &str, url: &str) {
        match self.inner.cache.claim(url, Instant::now()).await {
            Claim::Hit(title) => {
                tracing::debug!("cache hit for {}", url);
                self.inner.emit(channel, &title);
            }
            Claim::Pending => tracing::debug!("fetch already in flight for {}", url),
            Claim::Dispatch(generation) => self.dispatch(channel, url, generation),
        }
    }

    fn dispatch(&self, channel: &str, url: &str, generation: u64) {
        let duration = self.inner.spawn_duration_lookup(url);
        let inner = Arc::clone(&self.inner);
        let channel = channel.to_string();
        let link = url.to_string();

        self.inner.dispatcher.dispatch(url, move |result| async move {
            inner.finish(&channel, &link, generation, result, duration).await;
        });
    }

    /// Drop expired cache entries. Returns how many were removed.
    pub async fn sweep_cache(&self) -> usize {
        self.inner.cache.sweep(Instant::now()).await
    }

    pub fn in_flight(&self) -> usize {
        self.inner.dispatcher.in_flight()
    }

    /// Wait for every outstanding fetch to deliver its result.
    pub async fn shutdown(&self) {
        self.inner.dispatcher.drain().await;
    }
}

impl Inner {
    fn emit(&self, channel: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        self.host.emit(channel, &format!("{}\t{}", self.config.output_prefix, text));
    }

    /// Start the duration lookup alongside the page fetch.
    fn spawn_duration_lookup(&self, url: &str) -> Option<JoinHandle<Option<String>>> {
        let source = Arc::clone(self.durations.as_ref()?);
        extract_video_id(url)?;
        let url = url.to_string();
        Some(tokio::spawn(async move { lookup_duration(source.as_ref(), &url).await }))
    }

    async fn finish(
        &self, channel: &str, url: &str, generation: u64, result: Result<FetchResult, Error>,
        duration: Option<JoinHandle<Option<String>>>,
    ) {
        let title = match result.and_then(|fetched| title_from_fetch(&fetched)) {
            Ok(title) => title,
            Err(e) if e.is_transport() => {
                tracing::warn!("fetching {} failed: {}", url, e);
                if let Some(handle) = duration {
                    handle.abort();
                }
                self.cache.abandon(url, generation).await;
                return;
            }
            Err(e) => {
                tracing::debug!("no title for {}: {}", url, e);
                String::new()
            }
        };

        let duration_suffix = match duration {
            Some(handle) if !title.is_empty() => handle.await.ok().flatten(),
            Some(handle) => {
                handle.abort();
                None
            }
            None => None,
        };

        let output = TitleOutput::new(url, title, duration_suffix);
        let display = output.to_string();

        if !self.cache.complete(&output.url, generation, &display, Instant::now()).await || output.is_empty() {
            return;
        }

        self.emit(channel, &display);
    }
}
