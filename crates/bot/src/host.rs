//! Host interface and the stdio host.
//!
//! The chat client owns message hooks and output buffers. The orchestrator only
//! needs a way to print a line into a channel; everything else arrives through
//! [`LinkOrchestrator::on_incoming_message`](crate::orchestrator::LinkOrchestrator::on_incoming_message).

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Channel used for input lines that do not name one.
pub const DEFAULT_CHANNEL: &str = "default";

/// Output side of the chat client.
pub trait Host: Send + Sync {
    /// Print `text` into `channel`. Must not block.
    fn emit(&self, channel: &str, text: &str);
}

/// Host that writes `channel<TAB>text` lines to stdout from a dedicated task.
pub struct StdioHost {
    tx: mpsc::UnboundedSender<String>,
}

impl StdioHost {
    /// Create the host and spawn its writer task.
    ///
    /// The writer exits once every clone of the host has been dropped.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = rx.recv().await {
                if let Err(e) = stdout.write_all(line.as_bytes()).await {
                    tracing::error!("failed to write output: {}", e);
                    break;
                }
                if let Err(e) = stdout.flush().await {
                    tracing::error!("failed to flush output: {}", e);
                    break;
                }
            }
        });

        (Self { tx }, writer)
    }
}

impl Host for StdioHost {
    fn emit(&self, channel: &str, text: &str) {
        if self.tx.send(format!("{}\t{}\n", channel, text)).is_err() {
            tracing::warn!("output closed; dropping line for {}", channel);
        }
    }
}

/// Split an input line into channel and message.
///
/// Lines look like `channel<TAB>message`; without a tab the whole line is the
/// message for [`DEFAULT_CHANNEL`].
pub fn parse_line(line: &str) -> (&str, &str) {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.split_once('\t') {
        Some((channel, message)) if !channel.is_empty() => (channel, message),
        Some((_, message)) => (DEFAULT_CHANNEL, message),
        None => (DEFAULT_CHANNEL, line),
    }
}
