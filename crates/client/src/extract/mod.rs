//! Title extraction from fetched responses.
//!
//! ### Pipeline
//! - Resolve content type and charset (headers first, then `<meta>` tags).
//! - Decode the body, falling back to lossy UTF-8.
//! - Take the first `<title>` span, or the first line of `text/plain`.
//! - Collapse whitespace and decode character references.
//!
//! Only enough markup is tokenized to find titles and charset declarations;
//! there is no document tree.

pub mod content_type;
pub mod entities;
pub mod title;

pub use content_type::{ContentInfo, ResolvedContent, decode_body, parse_content_type, resolve, resolve_content};
pub use entities::decode_entities;
pub use title::{collapse_whitespace, extract_title};

use std::fmt;

use crate::fetch::FetchResult;
use linktitle_core::Error;

/// Final title for one URL, ready for the cache and the output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleOutput {
    pub url: String,
    pub title: String,
    /// Formatted video duration, e.g. `2:05`
    pub duration_suffix: Option<String>,
}

impl TitleOutput {
    pub fn new(url: impl Into<String>, title: impl Into<String>, duration_suffix: Option<String>) -> Self {
        Self { url: url.into(), title: title.into(), duration_suffix }
    }

    /// Nothing worth printing. A duration alone does not make a title.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
    }
}

impl fmt::Display for TitleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.duration_suffix {
            Some(duration) if !self.title.is_empty() => write!(f, "{} ({})", self.title, duration),
            _ => f.write_str(&self.title),
        }
    }
}

/// Run a fetch result through resolution, decoding and title extraction.
///
/// Non-success statuses yield `Error::HttpStatus`; callers treat that as an
/// empty title. A missing title is `Ok(String::new())`.
pub fn title_from_fetch(result: &FetchResult) -> Result<String, Error> {
    if !result.status.is_success() {
        return Err(Error::HttpStatus(result.status.as_u16()));
    }

    let content = resolve_content(&result.headers, &result.body);
    Ok(extract_title(&content.text, content.content_type.as_deref()))
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`.
pub(crate) fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{StatusCode, Url, header};

    fn fetched(status: StatusCode, content_type: Option<&str>, body: &'static [u8]) -> FetchResult {
        let mut headers = header::HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, ct.parse().unwrap());
        }
        FetchResult::from_parts(Url::parse("https://example.com/page").unwrap(), status, headers, body)
    }

    #[test]
    fn test_title_from_html() {
        let result = fetched(
            StatusCode::OK,
            Some("text/html; charset=utf-8"),
            b"<html><head><title>  Rust &amp; You\n</title></head>",
        );
        assert_eq!(title_from_fetch(&result).unwrap(), "Rust & You");
    }

    #[test]
    fn test_title_uses_meta_charset() {
        let result = fetched(StatusCode::OK, None, b"<meta charset=\"iso-8859-1\"><title>Stra\xdfe</title>");
        assert_eq!(title_from_fetch(&result).unwrap(), "Straße");
    }

    #[test]
    fn test_title_from_plain_text() {
        let result = fetched(StatusCode::OK, Some("text/plain; charset=us-ascii"), b"Release notes v1.2");
        assert_eq!(title_from_fetch(&result).unwrap(), "Release notes v1.2");
    }

    #[test]
    fn test_title_missing() {
        let result = fetched(StatusCode::OK, Some("text/html"), b"<html><head></head>");
        assert_eq!(title_from_fetch(&result).unwrap(), "");
    }

    #[test]
    fn test_title_error_status() {
        let result = fetched(StatusCode::NOT_FOUND, Some("text/html"), b"");
        assert!(matches!(title_from_fetch(&result), Err(Error::HttpStatus(404))));
    }

    #[test]
    fn test_title_output_display() {
        let plain = TitleOutput::new("https://example.com", "Example", None);
        assert_eq!(plain.to_string(), "Example");

        let video = TitleOutput::new("https://youtu.be/dQw4w9WgXcQ", "Song", Some("3:33".into()));
        assert_eq!(video.to_string(), "Song (3:33)");

        let untitled = TitleOutput::new("https://youtu.be/dQw4w9WgXcQ", "", Some("3:33".into()));
        assert!(untitled.is_empty());
        assert_eq!(untitled.to_string(), "");
    }

    #[test]
    fn test_find_ignore_ascii_case() {
        assert_eq!(find_ignore_ascii_case(b"abc</HEAD>", b"</head>"), Some(3));
        assert_eq!(find_ignore_ascii_case(b"</hea", b"</head>"), None);
        assert_eq!(find_ignore_ascii_case(b"", b"x"), None);
    }
}
