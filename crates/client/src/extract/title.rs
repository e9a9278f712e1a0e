//! Title extraction from decoded response text.

use super::entities::decode_entities;

const TITLE_OPEN: &str = "<title";
const TITLE_CLOSE: &str = "</title";

/// Produce the display title for a decoded body.
///
/// The first `<title>` span wins whatever the content type; without one,
/// `text/plain` bodies contribute their first line. Whitespace runs collapse to
/// a single space, the result is trimmed and character references decoded.
/// Control characters produced by references (`&#10;`, `&#0;`) become a single
/// space, so a title always fits on one output line.
/// Returns an empty string when nothing qualifies.
pub fn extract_title(text: &str, content_type: Option<&str>) -> String {
    let raw = match title_span(text) {
        Some(span) => span,
        None if is_plain_text(content_type) => text.lines().next().unwrap_or_default(),
        None => return String::new(),
    };

    strip_controls(&decode_entities(&collapse_whitespace(raw)))
}

/// Replace each run of control characters with one space and trim the edges.
fn strip_controls(text: &str) -> String {
    if !text.contains(char::is_control) {
        return text.to_string();
    }
    text.split(char::is_control)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse every whitespace run into one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_plain_text(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("text/plain"))
}

/// Inner text of the first `<title ...>...</title>` element, ASCII case-insensitive.
///
/// An unterminated title yields `None`.
fn title_span(text: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();

    let mut from = 0;
    let open = loop {
        let at = from + lower[from..].find(TITLE_OPEN)?;
        let after = at + TITLE_OPEN.len();
        match lower.as_bytes().get(after) {
            Some(b'>') => break after + 1,
            Some(b) if b.is_ascii_whitespace() => break after + lower[after..].find('>')? + 1,
            _ => from = after,
        }
    };

    let close = open + lower[open..].find(TITLE_CLOSE)?;
    Some(&text[open..close])
}
