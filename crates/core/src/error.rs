//! Unified error types for linktitle.
//!
//! Every failure in the title pipeline degrades to "no output for this URL";
//! these variants exist so callers can log what happened and decide whether the
//! cache entry should be kept or retried.

/// Unified error type shared by the fetch client and the orchestrator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The link could not be parsed or uses a scheme other than http/https.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// DNS, connect, TLS or body read failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// No response within the configured timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Server answered with a non-success status.
    #[error("HTTP_STATUS: {0}")]
    HttpStatus(u16),

    /// Body could not be decoded with the announced charset.
    #[error("DECODE_FAILED: {0}")]
    DecodeFailed(String),

    /// Video metadata lookup failed.
    #[error("METADATA_FAILED: {0}")]
    MetadataFailed(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),
}

impl Error {
    /// Whether the failure happened before any response was received.
    ///
    /// Transport failures leave nothing worth caching, so the next sighting of
    /// the same URL should try again.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::HttpError(_) | Error::FetchTimeout(_) | Error::InvalidUrl(_))
    }
}
