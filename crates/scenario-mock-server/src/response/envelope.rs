//! Response envelopes and their normalization into `MockResult`.

use crate::metrics::RESPONSE_DELAY_MS;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// The only shape the core hands to the transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockResult {
    pub status: u16,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// `None` is an empty body, `Some(Value::Null)` is a JSON `null`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl MockResult {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            response: None,
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            response: Some(body),
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What an HTTP mock declares (or its resolver returns)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// `None` when absent, `Some(Value::Null)` for an explicit `null`
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Milliseconds to hold the response back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl ResponseEnvelope {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn data(data: impl Into<Value>) -> Self {
        Self {
            data: Some(data.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }
}

/// Distinguish `"data": null` from a missing `data` key
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Normalize an envelope into a `MockResult`.
///
/// - `delay` holds the result back without blocking other requests
/// - status defaults to 200
/// - `content-type: application/json` is added when there is a body and no
///   content-type was declared
pub async fn finalize(envelope: ResponseEnvelope) -> MockResult {
    let ResponseEnvelope {
        data,
        status,
        mut headers,
        delay,
    } = envelope;

    if let Some(delay_ms) = delay.filter(|ms| *ms > 0) {
        debug!("Delaying response by {}ms", delay_ms);
        RESPONSE_DELAY_MS.observe(delay_ms as f64);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let has_content_type = headers
        .keys()
        .any(|key| key.eq_ignore_ascii_case("content-type"));
    if data.is_some() && !has_content_type {
        headers.insert("content-type".to_string(), "application/json".to_string());
    }

    MockResult {
        status: status.unwrap_or(200),
        headers,
        response: data,
    }
}
