//! Content type and charset resolution.
//!
//! Transport headers win. When they leave the MIME type or charset open, a
//! single forward scan over the body looks for `<meta charset>`,
//! `<meta http-equiv="content-type">` and the XML declaration's `encoding`,
//! first match in document order. No DOM is built.

use std::borrow::Cow;

use encoding_rs::Encoding;
use linktitle_core::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{self, HeaderMap};

/// Characters allowed in a header token: everything except separators,
/// whitespace and controls.
const TOKEN: &str = r#"[^()<>@,;:\\"/\[\]?={}\s\x00-\x1f\x7f]+"#;

static CONTENT_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"(?i)^\s*({TOKEN}/{TOKEN})(?:\s*;.*?charset\s*=\s*["']?({TOKEN}))?"#))
        .expect("invalid content-type pattern")
});

/// MIME type and charset of a response, either of which may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentInfo {
    /// Lowercased `type/subtype`
    pub content_type: Option<String>,
    /// Charset label as announced
    pub charset: Option<String>,
}

/// Decoded body together with the metadata used to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub text: String,
}

/// Parse a `type/subtype[; ... charset=token]` value.
pub fn parse_content_type(value: &str) -> ContentInfo {
    match CONTENT_TYPE_RE.captures(value) {
        Some(caps) => ContentInfo {
            content_type: caps.get(1).map(|m| m.as_str().to_ascii_lowercase()),
            charset: caps.get(2).map(|m| m.as_str().to_string()),
        },
        None => ContentInfo::default(),
    }
}

/// Combine the Content-Type header with metadata embedded in the body.
pub fn resolve(headers: &HeaderMap, body: &[u8]) -> ContentInfo {
    let mut info = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(parse_content_type)
        .unwrap_or_default();

    if info.content_type.is_none() || info.charset.is_none() {
        let hints = scan_meta(body);
        info.content_type = info.content_type.or(hints.content_type);
        info.charset = info.charset.or(hints.charset);
    }

    info
}

/// Resolve metadata and decode the body in one step.
pub fn resolve_content(headers: &HeaderMap, body: &[u8]) -> ResolvedContent {
    let info = resolve(headers, body);
    let text = decode_body(body, info.charset.as_deref());
    ResolvedContent { content_type: info.content_type, charset: info.charset, text }
}

/// Decode `body` using a charset label.
///
/// Malformed sequences are replaced; only an unknown label is an error.
pub fn decode_with_label(body: &[u8], label: &str) -> Result<String, Error> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::DecodeFailed(format!("unknown charset: {}", label)))?;
    let (text, _, _) = encoding.decode(body);
    Ok(text.into_owned())
}

/// Decode `body`, falling back to lossy UTF-8 when the charset is missing or unknown.
pub fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    if let Some(label) = charset {
        match decode_with_label(body, label) {
            Ok(text) => return text,
            Err(e) => tracing::debug!("{}; decoding as lossy utf-8", e),
        }
    }
    String::from_utf8_lossy(body).into_owned()
}

/// Scan markup for embedded content type and charset declarations.
pub fn scan_meta(body: &[u8]) -> ContentInfo {
    let mut info = ContentInfo::default();
    let mut scanner = TagScanner::new(body);

    while let Some(tag) = scanner.next_tag() {
        match tag.name.as_str() {
            "meta" => apply_meta(&mut info, &tag.attrs),
            "?xml" => {
                if info.charset.is_none() {
                    info.charset = attr(&tag.attrs, "encoding").map(str::to_string);
                }
            }
            "/head" | "body" => break,
            _ => {}
        }

        if info.content_type.is_some() && info.charset.is_some() {
            break;
        }
    }

    info
}

fn apply_meta(info: &mut ContentInfo, attrs: &[(String, String)]) {
    if let Some(charset) = attr(attrs, "charset")
        && info.charset.is_none()
    {
        info.charset = Some(charset.to_string());
    }

    if attr(attrs, "http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("content-type"))
        && let Some(content) = attr(attrs, "content")
    {
        let parsed = parse_content_type(content);
        info.content_type = info.content_type.take().or(parsed.content_type);
        info.charset = info.charset.take().or(parsed.charset);
    }
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.trim()).filter(|v| !v.is_empty())
}

#[derive(Debug)]
struct Tag {
    /// Lowercased, including a leading `/` or `?` when present
    name: String,
    /// Lowercased names with raw values
    attrs: Vec<(String, String)>,
}

/// Forward-only tag tokenizer: just enough to read start tags and their attributes.
struct TagScanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> TagScanner<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_past(&mut self, needle: &[u8]) {
        match super::find_ignore_ascii_case(&self.input[self.pos..], needle) {
            Some(offset) => self.pos += offset + needle.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> Cow<'a, str> {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos])
    }

    fn next_tag(&mut self) -> Option<Tag> {
        loop {
            let offset = self.input[self.pos..].iter().position(|b| *b == b'<')?;
            self.pos += offset + 1;

            if self.input[self.pos..].starts_with(b"!--") {
                self.skip_past(b"-->");
                continue;
            }

            let name = self.take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'?' | b'-' | b':'));
            if name.is_empty() {
                continue;
            }
            let name = name.to_ascii_lowercase();
            let attrs = self.attributes();
            return Some(Tag { name, attrs });
        }
    }

    fn attributes(&mut self) -> Vec<(String, String)> {
        let mut attrs = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/' | b'?') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let name = self
                .take_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/'))
                .to_ascii_lowercase();
            if name.is_empty() {
                self.pos += 1;
                continue;
            }

            self.skip_whitespace();
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()
            } else {
                String::new()
            };

            attrs.push((name, value));
        }

        attrs
    }

    fn attribute_value(&mut self) -> String {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let value = self.take_while(|b| b != quote).into_owned();
                if self.peek().is_some() {
                    self.pos += 1;
                }
                value
            }
            _ => self.take_while(|b| !b.is_ascii_whitespace() && b != b'>').into_owned(),
        }
    }
}
