//! linktitle entry point.
//!
//! Reads `channel<TAB>message` lines from stdin and prints
//! `channel<TAB>prefix<TAB>title` lines to stdout as titles arrive.
//! Logging goes to stderr to keep stdout for titles.

use std::sync::Arc;

use anyhow::Result;
use linktitle_client::{DurationClient, DurationConfig, DurationSource, FetchClient, FetchConfig};
use linktitle_core::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod host;
mod orchestrator;

use host::StdioHost;
use orchestrator::LinkOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    tracing::info!(
        timeout_ms = config.timeout_ms,
        cache_lifetime_secs = config.cache_lifetime_secs,
        duration_lookup = config.duration_lookup,
        "Starting linktitle on stdio"
    );

    let fetcher = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let durations: Option<Arc<dyn DurationSource>> = if config.duration_lookup {
        Some(Arc::new(DurationClient::new(DurationConfig::from(&config))?))
    } else {
        None
    };

    let (host, writer) = StdioHost::spawn();
    let orchestrator = LinkOrchestrator::new(&config, fetcher, durations, Arc::new(host));

    let sweeper = {
        let orchestrator = orchestrator.clone();
        let period = config.cache_lifetime();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = orchestrator.sweep_cache().await;
                tracing::debug!("swept {} expired titles", removed);
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let (channel, message) = host::parse_line(&line);
        orchestrator.on_incoming_message(channel, message, false).await;
    }

    tracing::info!("Input closed; waiting for {} outstanding fetches", orchestrator.in_flight());
    orchestrator.shutdown().await;
    tracing::info!("Shutting down with {} cached titles", orchestrator.cache().len().await);

    sweeper.abort();
    let _ = sweeper.await;
    drop(orchestrator);
    writer.await?;

    Ok(())
}
