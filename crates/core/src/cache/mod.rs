//! In-memory title cache.
//!
//! Maps a URL to the last title fetched for it. It supports:
//!
//! - Time-based expiry (`cache_lifetime`, default 6h)
//! - In-flight tracking so a URL is fetched at most once at a time
//! - Generation tokens so a superseded fetch cannot overwrite a newer entry
//! - TTL sweeps to bound memory in long-running processes
//!
//! Nothing is persisted; entries live for the lifetime of the process.

pub mod entry;
pub mod store;

pub use entry::{CacheEntry, Claim};
pub use store::TitleCache;
