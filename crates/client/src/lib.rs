//! Client code for linktitle.
//!
//! This crate provides the HTTP fetch pipeline, the background fetch
//! dispatcher, title extraction and the video duration lookup used by the bot.

pub mod extract;
pub mod fetch;
pub mod video;

pub use extract::{TitleOutput, decode_entities, extract_title, resolve, title_from_fetch};
pub use fetch::{Dispatcher, FetchClient, FetchConfig, FetchResult, Fetcher};
pub use video::{DurationClient, DurationConfig, DurationSource, format_duration, lookup_duration};
