//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::Error;
use crate::config::{AppConfig, VIDEO_ID_PLACEHOLDER};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `cache_lifetime_secs` is 0
    /// - `user_agent` or `output_prefix` is empty
    /// - `duration_endpoint` lacks the `{video_id}` placeholder while lookups are enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.cache_lifetime_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_lifetime_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.output_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "output_prefix".into(), reason: "must not be empty".into() });
        }

        if self.duration_lookup && !self.duration_endpoint.contains(VIDEO_ID_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                field: "duration_endpoint".into(),
                reason: format!("must contain {VIDEO_ID_PLACEHOLDER}"),
            });
        }

        if self.system_channels.is_empty() {
            tracing::warn!("system_channels is empty; titles may be posted to core buffers");
        }

        Ok(())
    }
}
