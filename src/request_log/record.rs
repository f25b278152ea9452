//! The persisted request log row.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request_log::extract::RequestMeta;

/// A query parameter value: scalar for a single occurrence, a list once the
/// key repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// Add another occurrence. A scalar becomes a two-element list; a list
    /// only ever grows.
    pub fn push(&mut self, value: String) {
        match self {
            QueryValue::Multi(values) => values.push(value),
            QueryValue::Single(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Multi(vec![first, value]);
            }
        }
    }
}

/// One entry per handled HTTP request, matching the `request_logs` table.
///
/// `body` and `response_body` distinguish "not captured" (`None`, omitted
/// from the row) from "captured but not JSON" (`Some(Value::Null)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub ip_address: String,
    pub user_agent: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, QueryValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    pub response_status: u16,
    /// Milliseconds from receipt to response availability.
    pub response_time: u64,
}

impl LogRecord {
    pub fn new(
        meta: RequestMeta,
        body: Option<Value>,
        response_body: Option<Value>,
        response_status: u16,
        response_time: u64,
    ) -> Self {
        Self {
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
            method: meta.method,
            url: meta.url,
            headers: meta.headers,
            query_params: meta.query_params,
            body,
            response_body,
            response_status,
            response_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_never_collapses() {
        let mut value = QueryValue::Single("a".into());
        value.push("b".into());
        value.push("c".into());
        assert_eq!(value, QueryValue::Multi(vec!["a".into(), "b".into(), "c".into()]));
    }

    #[test]
    fn test_row_shape() {
        let mut query_params = BTreeMap::new();
        query_params.insert("tag".to_string(), QueryValue::Multi(vec!["a".into(), "b".into()]));
        query_params.insert("page".to_string(), QueryValue::Single("2".into()));

        let record = LogRecord {
            ip_address: "1.2.3.4".into(),
            user_agent: "curl/8.0".into(),
            method: "GET".into(),
            url: "/api/snippets".into(),
            headers: BTreeMap::new(),
            query_params,
            body: None,
            response_body: Some(Value::Null),
            response_status: 200,
            response_time: 12,
        };

        let row = serde_json::to_value(&record).unwrap();
        assert_eq!(row["query_params"], json!({ "page": "2", "tag": ["a", "b"] }));
        assert!(row.get("body").is_none());
        assert_eq!(row["response_body"], Value::Null);
        assert_eq!(row["response_status"], 200);
    }
}
