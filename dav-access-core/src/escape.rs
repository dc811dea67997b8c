//! Escaping for principal URLs and XML text

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_xml::escape::escape;
use std::fmt::Write;

/// Bytes left alone inside a single path segment: RFC3986 `pchar`.
///
/// Everything else, `/` included, is percent-encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// Percent-escape `raw` so it can stand as exactly one path segment
pub fn escape_path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

/// Entity-escape `raw` for use as XML character data
///
/// Markup characters become named entities and anything outside ASCII becomes
/// a numeric character reference, so the result is plain ASCII.
pub fn escape_entity(raw: &str) -> String {
    let escaped = escape(raw);
    if escaped.is_ascii() {
        return escaped.into_owned();
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            // Writing into a String cannot fail
            let _ = write!(out, "&#{};", c as u32);
        }
    }
    out
}
