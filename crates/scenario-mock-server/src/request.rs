//! Transport-agnostic request shape consumed by the core.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A query-string value: repeated keys collapse into a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// First value for the key
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value.as_str()),
            QueryValue::Multiple(values) => values.first().map(String::as_str),
        }
    }
}

pub type QueryMap = HashMap<String, QueryValue>;

/// Request body as handed over by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw text (bare GraphQL documents, unparsed or malformed payloads)
    Text(String),
    /// A decoded JSON or form payload
    Json(Value),
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Text(String::new())
    }
}

impl RequestBody {
    /// The body as seen by HTTP resolvers: decoded objects pass through,
    /// everything else becomes an empty object.
    pub fn as_object_value(&self) -> Value {
        match self {
            RequestBody::Json(value @ Value::Object(_)) => value.clone(),
            _ => Value::Object(Default::default()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub query: QueryMap,
    /// Header names are lower-case
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
}

impl MockRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .insert(key.into(), QueryValue::Single(value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(QueryValue::first)
    }
}

/// Parse a raw query string into a `QueryMap`, percent-decoding keys and
/// values. Repeated keys accumulate into `QueryValue::Multiple`.
pub fn parse_query_string(query: &str) -> QueryMap {
    let mut map = QueryMap::new();
    for pair in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        let value = decode_component(value);
        match map.remove(&key) {
            None => {
                map.insert(key, QueryValue::Single(value));
            }
            Some(QueryValue::Single(existing)) => {
                map.insert(key, QueryValue::Multiple(vec![existing, value]));
            }
            Some(QueryValue::Multiple(mut values)) => {
                values.push(value);
                map.insert(key, QueryValue::Multiple(values));
            }
        }
    }
    map
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}
