//! HTML character reference decoding.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|[A-Za-z][A-Za-z0-9]*);").expect("invalid reference pattern"));

/// Replace numeric and named character references in one pass.
///
/// References that do not resolve (unknown names, invalid code points) stay
/// as written. Replacement text is never scanned again, so `&amp;lt;` becomes
/// `&lt;`, not `<`.
pub fn decode_entities(text: &str) -> String {
    REFERENCE_RE
        .replace_all(text, |caps: &Captures| {
            resolve_reference(&caps[0], &caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn resolve_reference(reference: &str, body: &str) -> Option<String> {
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    // The named table maps to at most two code points; anything longer means
    // only a legacy prefix (e.g. `&not` in `&notit;`) matched.
    let decoded = html_escape::decode_html_entities(reference);
    if decoded != reference && decoded.chars().count() <= 2 { Some(decoded.into_owned()) } else { None }
}
