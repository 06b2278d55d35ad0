//! Shared value types for path bindings, request data and headers.

use std::collections::BTreeMap;

/// Path-parameter bindings and request data. Insertion order is kept so
/// query strings come out in the order the caller wrote them.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Header name to value. Later layers override earlier ones key by key.
pub type Headers = BTreeMap<String, String>;

/// Insert `name: value`, replacing any entry whose name differs only in case.
pub fn set_header(headers: &mut Headers, name: &str, value: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

/// Shallow merge where entries of `overrides` win. Names compare
/// case-insensitively; the overriding spelling is kept.
pub fn merge_headers(base: &Headers, overrides: &Headers) -> Headers {
    let mut merged = base.clone();
    for (name, value) in overrides {
        set_header(&mut merged, name, value);
    }
    merged
}

/// Build a `Headers` map from borrowed pairs.
pub fn headers<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Headers {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
