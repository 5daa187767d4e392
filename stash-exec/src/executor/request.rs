use std::collections::BTreeMap;

use serde_json::Value;
use stash_core::types::ValueMap;
use stash_core::{MaterializedRequest, ResolvedRequest};

use crate::executor::http::HttpRequestParts;
use crate::executor::ExecError;

pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Joins root and path with exactly one `/` and appends the encoded query.
pub fn build_url(root: &str, path: &str, query: Option<&ValueMap>) -> String {
    let base = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut url = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let sep = if url.contains('?') { '&' } else { '?' };
        url.push(sep);
        url.push_str(&encode_query(query));
    }
    url
}

/// Form-encodes a query map. Lists repeat their key; `/`, `:` and `?` stay literal.
pub fn encode_query(query: &ValueMap) -> String {
    let mut pairs = Vec::new();
    for (k, v) in query {
        match v {
            Value::Array(items) => {
                for item in items {
                    pairs.push(format!("{}={}", encode_component(k), encode_component(&scalar(item))));
                }
            }
            other => pairs.push(format!("{}={}", encode_component(k), encode_component(&scalar(other)))),
        }
    }
    pairs.join("&")
}

fn encode_component(s: &str) -> String {
    urlencoding::encode(s)
        .replace("%2F", "/")
        .replace("%3A", ":")
        .replace("%3F", "?")
        .replace("%20", "+")
}

/// Header and query values: strings as-is, anything else as compact JSON.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// JSON-encodes a body map, falling back to its plain rendering.
pub fn encode_body(body: &ValueMap) -> Vec<u8> {
    serde_json::to_vec(body).unwrap_or_else(|_| Value::Object(body.clone()).to_string().into_bytes())
}

pub fn build_headers(headers: Option<&ValueMap>, has_body: bool) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = headers
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), scalar(v)))
        .collect();
    if has_body && !out.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
        out.insert("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string());
    }
    out
}

pub fn build_request(
    req: &ResolvedRequest,
    live: &MaterializedRequest,
) -> Result<HttpRequestParts, ExecError> {
    let raw = build_url(&live.url_root, &live.url_path, live.query.as_ref());
    let url = url::Url::parse(&raw).map_err(|e| ExecError::InvalidUrl {
        url: raw.clone(),
        message: e.to_string(),
    })?;
    let body = live.body.as_ref().map(encode_body);
    Ok(HttpRequestParts {
        method: live.method.as_str().to_string(),
        url,
        headers: build_headers(live.headers.as_ref(), body.is_some()),
        body,
        insecure_tls: req.insecure_tls,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(v: Value) -> ValueMap {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn url_joins_with_single_slash() {
        assert_eq!(build_url("http://x/", "/a", None), "http://x/a");
        assert_eq!(build_url("http://x", "a", None), "http://x/a");
        assert_eq!(build_url("http://x/", "", None), "http://x");
    }

    #[test]
    fn query_separator_depends_on_existing_query() {
        let q = map(json!({"page": 2}));
        assert_eq!(build_url("http://x", "/a", Some(&q)), "http://x/a?page=2");
        assert_eq!(build_url("http://x", "/a?b=1", Some(&q)), "http://x/a?b=1&page=2");
        assert_eq!(build_url("http://x", "/a", Some(&ValueMap::new())), "http://x/a");
    }

    #[test]
    fn query_encoding_repeats_lists_and_keeps_safe_chars() {
        let q = map(json!({"tag": ["a b", "c&d"], "next": "/p:1?", "on": true}));
        assert_eq!(encode_query(&q), "tag=a+b&tag=c%26d&next=/p:1?&on=true");
    }

    #[test]
    fn body_sets_default_content_type_once() {
        let h = build_headers(Some(&map(json!({"content-type": "text/plain"}))), true);
        assert_eq!(h.len(), 1);
        let h = build_headers(None, true);
        assert_eq!(h["Content-Type"], DEFAULT_CONTENT_TYPE);
        assert!(build_headers(None, false).is_empty());
    }

    #[test]
    fn non_string_header_values_are_stringified() {
        let h = build_headers(Some(&map(json!({"X-Count": 3, "X-On": false}))), false);
        assert_eq!(h["X-Count"], "3");
        assert_eq!(h["X-On"], "false");
    }
}
