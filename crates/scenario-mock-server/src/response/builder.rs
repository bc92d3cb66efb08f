use super::envelope::MockResult;
use bytes::Bytes;
use http_body_util::Full;
use hyper::http::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Response, StatusCode};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

/// Builds hyper responses out of `MockResult`s and transport-level replies.
pub struct HttpResponseBuilder {
    status: StatusCode,
    body: Bytes,
    headers: HeaderMap,
}

impl HttpResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        HttpResponseBuilder {
            status,
            body: Bytes::new(),
            headers: Default::default(),
        }
    }

    /// Translate a core result.
    ///
    /// The body is JSON-encoded when the declared content-type is
    /// `application/json`; otherwise strings are written raw and any other
    /// value is JSON-encoded.
    pub fn from_result(result: &MockResult) -> Self {
        let status = StatusCode::from_u16(result.status).unwrap_or_else(|_| {
            warn!("Invalid status code {}, answering 500", result.status);
            StatusCode::INTERNAL_SERVER_ERROR
        });

        let is_json = result
            .header("content-type")
            .map(|ct| ct.to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false);

        let body = match &result.response {
            None => Bytes::new(),
            Some(Value::String(text)) if !is_json => Bytes::from(text.clone()),
            Some(value) => Bytes::from(serde_json::to_vec(value).unwrap_or_default()),
        };

        Self::new(status).merge_headers(&result.headers).body(body)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
                self
            }
            _ => {
                warn!("Dropping invalid response header {:?}", name);
                self
            }
        }
    }

    /// Append a header without replacing existing values of the same name
    pub fn append_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn merge_headers<'a, H>(mut self, headers: H) -> Self
    where
        H: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in headers {
            self = self.header(key, value);
        }
        self
    }

    pub fn build(self) -> Response<Full<Bytes>> {
        let mut response = Response::builder()
            .status(self.status)
            .body(Full::new(self.body))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))));

        response.headers_mut().extend(self.headers);
        response
    }
}
