//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LINKTITLE_*)
//! 2. TOML config file (if LINKTITLE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Placeholder substituted with the video ID in `duration_endpoint`.
pub const VIDEO_ID_PLACEHOLDER: &str = "{video_id}";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LINKTITLE_*)
/// 2. TOML config file (if LINKTITLE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for HTTP requests.
    ///
    /// Set via LINKTITLE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LINKTITLE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Seconds a fetched title stays valid before the URL is fetched again.
    ///
    /// Set via LINKTITLE_CACHE_LIFETIME_SECS environment variable.
    #[serde(default = "default_cache_lifetime_secs")]
    pub cache_lifetime_secs: u64,

    /// Upper bound on bytes read from a single response.
    ///
    /// Set via LINKTITLE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Tag printed in front of every title line. Messages starting with it are
    /// treated as our own output.
    ///
    /// Set via LINKTITLE_OUTPUT_PREFIX environment variable.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Channels that never get link titles (server/core buffers).
    ///
    /// Set via LINKTITLE_SYSTEM_CHANNELS environment variable (array syntax: `[a, b]`).
    #[serde(default = "default_system_channels")]
    pub system_channels: Vec<String>,

    /// Whether video links get a duration suffix.
    ///
    /// Set via LINKTITLE_DURATION_LOOKUP environment variable.
    #[serde(default = "default_true")]
    pub duration_lookup: bool,

    /// Metadata endpoint template; `{video_id}` is replaced by the video ID.
    ///
    /// Set via LINKTITLE_DURATION_ENDPOINT environment variable.
    #[serde(default = "default_duration_endpoint")]
    pub duration_endpoint: String,
}

fn default_user_agent() -> String {
    format!("linktitle/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_ms() -> u64 {
    3_000
}

fn default_cache_lifetime_secs() -> u64 {
    6 * 60 * 60
}

fn default_max_bytes() -> usize {
    512 * 1024
}

fn default_output_prefix() -> String {
    "[linktitle]".into()
}

fn default_system_channels() -> Vec<String> {
    vec!["core.weechat".into()]
}

fn default_true() -> bool {
    true
}

fn default_duration_endpoint() -> String {
    "https://gdata.youtube.com/feeds/api/videos/{video_id}?v=2&alt=json".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            cache_lifetime_secs: default_cache_lifetime_secs(),
            max_bytes: default_max_bytes(),
            output_prefix: default_output_prefix(),
            system_channels: default_system_channels(),
            duration_lookup: true,
            duration_endpoint: default_duration_endpoint(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache lifetime as Duration.
    pub fn cache_lifetime(&self) -> Duration {
        Duration::from_secs(self.cache_lifetime_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LINKTITLE_`
    /// 2. TOML file from `LINKTITLE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LINKTITLE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LINKTITLE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Whether titles must never be posted to this channel.
    pub fn is_system_channel(&self, channel: &str) -> bool {
        self.system_channels.iter().any(|c| c == channel)
    }
}
