//! Out-of-line fetch execution.
//!
//! Each dispatched fetch runs as its own tokio task bounded by the configured
//! timeout. The completion callback is invoked exactly once per dispatch, with
//! either the fetch result or the error that ended it.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use linktitle_core::Error;
use tokio::task::JoinSet;

use super::{FetchResult, Fetcher};

/// Runs fetches on background tasks and reports back through callbacks.
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    tasks: Mutex<JoinSet<()>>,
}

impl Dispatcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout, tasks: Mutex::new(JoinSet::new()) }
    }

    /// Start fetching `url` without waiting for it.
    ///
    /// `on_complete` runs on the spawned task once the fetch finishes, fails,
    /// or exceeds the timeout. A timed-out fetch is dropped, so no late result
    /// can reach the callback afterwards.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch<F, Fut>(&self, url: &str, on_complete: F)
    where
        F: FnOnce(Result<FetchResult, Error>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let fetcher = Arc::clone(&self.fetcher);
        let timeout = self.timeout;
        let url = url.to_string();

        let task = async move {
            let result = match tokio::time::timeout(timeout, fetcher.fetch(&url)).await {
                Ok(result) => result,
                Err(_) => Err(Error::FetchTimeout(format!("{} after {}ms", url, timeout.as_millis()))),
            };
            on_complete(result).await;
        };

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Number of dispatched fetches whose callbacks have not finished.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Wait until every dispatched fetch and its callback has finished.
    pub async fn drain(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
            if pending.is_empty() {
                return;
            }
            while let Some(joined) = pending.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!("fetch task failed: {}", e);
                }
            }
        }
    }
}
