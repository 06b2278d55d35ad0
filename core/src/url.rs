//! URL assembly: path-template interpolation, query strings and the final
//! absolute URL.
//!
//! # Design
//! Interpolation is a single pass over separator-delimited segments. A
//! substituted value is written to the output and never scanned again, so a
//! binding that itself looks like `{token}` cannot trigger a second
//! replacement. Tokens with no binding stay in the path verbatim; callers may
//! template partial paths on purpose.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::types::Params;

/// Characters left alone by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn is_separator(ch: char) -> bool {
    matches!(ch, '/' | '.' | '?')
}

/// Percent-encode a single URL component.
pub fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Replace every `{name}` segment of `template` that has a binding.
pub fn interpolate(template: &str, bindings: &Params) -> String {
    if bindings.is_empty() {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len());
    let mut start = 0;
    for (idx, ch) in template.char_indices() {
        if is_separator(ch) {
            push_segment(&mut out, &template[start..idx], bindings);
            out.push(ch);
            start = idx + ch.len_utf8();
        }
    }
    push_segment(&mut out, &template[start..], bindings);
    out
}

fn push_segment(out: &mut String, segment: &str, bindings: &Params) {
    let bound = token_name(segment)
        .and_then(|name| bindings.get(name))
        .and_then(value_text);
    match bound {
        Some(text) => out.extend(utf8_percent_encode(&text, COMPONENT)),
        None => out.push_str(segment),
    }
}

/// The identifier inside a `{identifier}` segment, if the whole segment is one.
fn token_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('{')?.strip_suffix('}')?;
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    valid.then_some(name)
}

/// Textual form of a bound value. `null` counts as unbound.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Append `data` to `path` as a query string.
///
/// Sequences expand to one `key[]=value` pair per element, in order; a
/// `null` element is written as `null`. Top-level `null` values are skipped.
/// Keys are written as given; values are percent-encoded.
pub fn attach_query(path: &str, data: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in data {
        match value {
            Value::Array(items) => pairs.extend(items.iter().map(|item| {
                let text = value_text(item).unwrap_or_else(|| "null".to_string());
                format!("{key}[]={}", encode_component(&text))
            })),
            other => {
                if let Some(text) = value_text(other) {
                    pairs.push(format!("{key}={}", encode_component(&text)));
                }
            }
        }
    }
    if pairs.is_empty() {
        return path.to_string();
    }
    let joiner = if path.contains('?') { '&' } else { '?' };
    format!("{path}{joiner}{}", pairs.join("&"))
}

/// Compose `scheme://host[:port]/path`, dropping one leading `/` from the
/// path and one trailing `/` from the host.
pub fn compose(scheme: &str, host: &str, port: Option<u16>, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    let host = host.strip_suffix('/').unwrap_or(host);
    match port {
        Some(port) => format!("{scheme}://{host}:{port}/{path}"),
        None => format!("{scheme}://{host}/{path}"),
    }
}
