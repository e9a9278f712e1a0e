//! HTTP fetch pipeline with capped reads.
//!
//! ### What gets read
//! - HTML/XML (or no Content-Type at all): chunks until `</head>` shows up,
//!   the stream ends, or `max_bytes` is reached. Title and charset metadata
//!   live in the head, so the rest of the page is never downloaded.
//! - `text/plain`: the first line only.
//! - Anything else: headers only.
//!
//! ### Failure reporting
//! - Transport failures map to `Error::HttpError`, timeouts to `Error::FetchTimeout`.
//! - Non-2xx responses are returned as a `FetchResult` with an empty body; the
//!   title pipeline turns them into "no title".

pub mod dispatch;
pub mod url;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::time::{Duration, Instant};

pub use dispatch::Dispatcher;
pub use reqwest::{StatusCode, Url, header};
pub use self::url::{UrlError, parse_link};

use crate::extract::find_ignore_ascii_case;
use linktitle_core::{AppConfig, Error};
use reqwest::Client;

/// Marker that ends a markup read.
const HEAD_END: &[u8] = b"</head>";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "linktitle/<version>")
    pub user_agent: String,

    /// Maximum bytes read from one response body (default: 512KB)
    pub max_bytes: usize,

    /// Request timeout (default: 3s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
        }
    }
}

/// Raw result of one fetch, consumed once by the title pipeline.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers (case-insensitive)
    pub headers: header::HeaderMap,
    /// Body prefix as read by the capped reader
    pub body: Bytes,
    /// Whether reading stopped at `max_bytes`
    pub truncated: bool,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResult {
    /// Build a result from parts, mainly for fakes and tests.
    pub fn from_parts(url: Url, status: StatusCode, headers: header::HeaderMap, body: impl Into<Bytes>) -> Self {
        Self { final_url: url.clone(), url, status, headers, body: body.into(), truncated: false, fetch_ms: 0 }
    }

    /// Content-Type header value, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Something that can perform one GET and hand back a [`FetchResult`].
///
/// The dispatcher only knows this trait, so tests can swap the network out.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResult, Error>;
}

/// How much of a body is worth reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// HTML or XML: read through `</head>`.
    Markup,
    /// Plain text: read the first line.
    PlainText,
    /// No title can come out of it; skip the body.
    Skip,
}

impl BodyKind {
    /// Classify a Content-Type header value.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(value) = content_type else {
            return BodyKind::Markup;
        };
        let value = value.to_ascii_lowercase();
        if value.contains("html") || value.contains("xml") {
            BodyKind::Markup
        } else if value.trim_start().starts_with("text/plain") {
            BodyKind::PlainText
        } else {
            BodyKind::Skip
        }
    }
}

/// Accumulates body chunks until the reader has seen enough.
#[derive(Debug)]
pub struct BodyReader {
    kind: BodyKind,
    max_bytes: usize,
    buf: BytesMut,
    done: bool,
    truncated: bool,
}

impl BodyReader {
    pub fn new(kind: BodyKind, max_bytes: usize) -> Self {
        Self { kind, max_bytes, buf: BytesMut::new(), done: kind == BodyKind::Skip, truncated: false }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed the next chunk. Returns true once no more input is needed.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        if self.done {
            return true;
        }

        let scan_from = self.buf.len().saturating_sub(HEAD_END.len());
        self.buf.extend_from_slice(chunk);

        match self.kind {
            BodyKind::Markup => {
                if find_ignore_ascii_case(&self.buf[scan_from..], HEAD_END).is_some() {
                    self.done = true;
                }
            }
            BodyKind::PlainText => {
                if let Some(pos) = self.buf[scan_from..].iter().position(|b| *b == b'\n') {
                    self.buf.truncate(scan_from + pos);
                    self.done = true;
                }
            }
            BodyKind::Skip => self.done = true,
        }

        if !self.done && self.buf.len() >= self.max_bytes {
            self.buf.truncate(self.max_bytes);
            self.truncated = true;
            self.done = true;
        }

        self.done
    }

    /// Body read so far and whether it was cut at `max_bytes`.
    pub fn finish(self) -> (Bytes, bool) {
        (self.buf.freeze(), self.truncated)
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn map_reqwest(url: &Url, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(url.to_string())
        } else {
            Error::HttpError(format!("network error: {}", err))
        }
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    /// Fetch a URL, reading only as much of the body as the title needs.
    async fn fetch(&self, url_str: &str) -> Result<FetchResult, Error> {
        let start = Instant::now();
        let url = parse_link(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,text/plain;q=0.8,*/*;q=0.5")
            .send()
            .await
            .map_err(|e| Self::map_reqwest(&url, &e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let mut reader = if status.is_success() {
            let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
            BodyReader::new(BodyKind::from_content_type(content_type), self.config.max_bytes)
        } else {
            BodyReader::new(BodyKind::Skip, self.config.max_bytes)
        };

        while !reader.is_done() {
            match response.chunk().await.map_err(|e| Self::map_reqwest(&url, &e))? {
                Some(chunk) => {
                    reader.push(&chunk);
                }
                None => break,
            }
        }

        let (body, truncated) = reader.finish();
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} ({}) in {}ms ({} bytes{})",
            url,
            final_url,
            status.as_u16(),
            fetch_ms,
            body.len(),
            if truncated { ", truncated" } else { "" }
        );

        Ok(FetchResult { url, final_url, status, headers, body, truncated, fetch_ms })
    }
}
