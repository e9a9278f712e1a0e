//! Video metadata client error types.

use std::sync::Arc;

use linktitle_core::Error;

/// Errors from the video metadata endpoint.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataError {
    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Response parsed but carried no duration.
    #[error("no duration in response")]
    MissingDuration,
}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { MetadataError::Timeout } else { MetadataError::Network(Arc::new(err)) }
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::MetadataFailed(err.to_string())
    }
}
