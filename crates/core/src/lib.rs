//! Core types and shared functionality for linktitle.
//!
//! This crate provides:
//! - In-memory title cache with expiry and in-flight tracking
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, Claim, TitleCache};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
