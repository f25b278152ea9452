//! Request metadata extraction.
//!
//! Every function here is total: missing or malformed input yields a
//! default instead of an error.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use axum::http::{request::Parts, HeaderMap};
use url::form_urlencoded;

use crate::request_log::record::QueryValue;

/// Headers never copied into a log record, compared case-insensitively.
pub const SENSITIVE_HEADERS: [&str; 2] = ["authorization", "cookie"];

const UNKNOWN: &str = "unknown";

/// Request-side fields of a log record.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub ip_address: String,
    pub user_agent: String,
    pub method: String,
    /// Path only, without the query string.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, QueryValue>,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            ip_address: client_ip(&parts.headers),
            user_agent: user_agent(&parts.headers),
            method: parts.method.to_string(),
            url: parts.uri.path().to_string(),
            headers: filtered_headers(&parts.headers),
            query_params: query_params(parts.uri.query()),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Best-effort client address: first `x-forwarded-for` hop, then
/// `x-real-ip`, then `"unknown"`. The value is not validated.
pub fn client_ip(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .unwrap_or(UNKNOWN)
        .to_string()
}

pub fn user_agent(headers: &HeaderMap) -> String {
    header_str(headers, "user-agent").unwrap_or(UNKNOWN).to_string()
}

pub fn is_sensitive(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
}

/// All headers except the sensitive ones. Keys are lower-case; for repeated
/// headers the last value wins.
pub fn filtered_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| !is_sensitive(name.as_str()))
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Decode a query string, folding repeated keys into ordered lists.
pub fn query_params(query: Option<&str>) -> BTreeMap<String, QueryValue> {
    let mut params = BTreeMap::new();

    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match params.entry(key.into_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(QueryValue::Single(value.into_owned()));
            }
            Entry::Occupied(mut slot) => slot.get_mut().push(value.into_owned()),
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(Body::empty()).unwrap().into_parts().0
    }

    #[test]
    fn test_ip_from_forwarded_for() {
        let p = parts(
            Request::builder()
                .header("x-forwarded-for", "1.2.3.4, 5.6.7.8")
                .header("x-real-ip", "9.9.9.9"),
        );
        assert_eq!(client_ip(&p.headers), "1.2.3.4");
    }

    #[test]
    fn test_ip_from_real_ip() {
        let p = parts(Request::builder().header("x-real-ip", "9.9.9.9"));
        assert_eq!(client_ip(&p.headers), "9.9.9.9");
    }

    #[test]
    fn test_ip_unknown() {
        let p = parts(Request::builder());
        assert_eq!(client_ip(&p.headers), "unknown");
    }

    #[test]
    fn test_ip_skips_empty_forwarded_hop() {
        let p = parts(
            Request::builder()
                .header("x-forwarded-for", " , 5.6.7.8")
                .header("x-real-ip", "9.9.9.9"),
        );
        assert_eq!(client_ip(&p.headers), "9.9.9.9");
    }

    #[test]
    fn test_sensitive_headers_dropped_any_case() {
        let p = parts(
            Request::builder()
                .header("Authorization", "Bearer secret")
                .header("COOKIE", "sb=1")
                .header("Content-Type", "application/json")
                .header("x-trace", "one")
                .header("x-trace", "two"),
        );
        let headers = filtered_headers(&p.headers);

        assert!(headers.keys().all(|k| !is_sensitive(k)));
        assert_eq!(headers.get("content-type").map(String::as_str), Some("application/json"));
        assert_eq!(headers.get("x-trace").map(String::as_str), Some("two"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_user_agent_default() {
        let p = parts(Request::builder());
        assert_eq!(user_agent(&p.headers), "unknown");

        let p = parts(Request::builder().header("user-agent", "curl/8.0"));
        assert_eq!(user_agent(&p.headers), "curl/8.0");
    }

    #[test]
    fn test_query_folding() {
        let one = query_params(Some("tag=a"));
        assert_eq!(one["tag"], QueryValue::Single("a".into()));

        let two = query_params(Some("tag=a&tag=b"));
        assert_eq!(two["tag"], QueryValue::Multi(vec!["a".into(), "b".into()]));

        let three = query_params(Some("tag=a&page=2&tag=b&tag=c"));
        assert_eq!(
            three["tag"],
            QueryValue::Multi(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(three["page"], QueryValue::Single("2".into()));
    }

    #[test]
    fn test_query_decoding() {
        let params = query_params(Some("search=hello%20world&lang=c%2B%2B"));
        assert_eq!(params["search"], QueryValue::Single("hello world".into()));
        assert_eq!(params["lang"], QueryValue::Single("c++".into()));
        assert!(query_params(None).is_empty());
    }

    #[test]
    fn test_meta_uses_path_only() {
        let p = parts(Request::builder().method("POST").uri("/api/snippets?page=2"));
        let meta = RequestMeta::from_parts(&p);
        assert_eq!(meta.method, "POST");
        assert_eq!(meta.url, "/api/snippets");
        assert_eq!(meta.query_params["page"], QueryValue::Single("2".into()));
    }
}
