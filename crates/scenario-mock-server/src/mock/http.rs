//! HTTP mock definitions.

use crate::context::Context;
use crate::request::QueryMap;
use crate::response::{MockResponse, ResponseEnvelope};
use crate::session::ContextUpdater;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(format!("Unsupported HTTP method: {other}")),
        }
    }
}

/// Route pattern of an HTTP mock
#[derive(Debug, Clone)]
pub enum MockUrl {
    /// Path template such as `/api/users/:id`
    Template(String),
    /// Raw regular expression matched against the request path
    Pattern(Regex),
}

impl MockUrl {
    /// Identity used when deduplicating `(url, method)` pairs
    pub fn key(&self) -> String {
        match self {
            MockUrl::Template(template) => template.clone(),
            MockUrl::Pattern(regex) => format!("/{}/", regex.as_str()),
        }
    }
}

impl From<&str> for MockUrl {
    fn from(template: &str) -> Self {
        MockUrl::Template(template.to_string())
    }
}

impl From<String> for MockUrl {
    fn from(template: String) -> Self {
        MockUrl::Template(template)
    }
}

impl From<Regex> for MockUrl {
    fn from(regex: Regex) -> Self {
        MockUrl::Pattern(regex)
    }
}

/// Request facts handed to HTTP response functions
#[derive(Debug, Clone)]
pub struct HttpFacts {
    pub method: String,
    pub path: String,
    pub query: QueryMap,
    /// Percent-decoded path parameters
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    /// Decoded request body; always an object (empty for raw text bodies)
    pub body: Value,
    /// Session context as of the start of resolution
    pub context: Context,
    pub update_context: ContextUpdater,
}

pub type HttpResponse = MockResponse<HttpFacts, ResponseEnvelope>;

impl From<ResponseEnvelope> for MockResponse<HttpFacts, ResponseEnvelope> {
    fn from(envelope: ResponseEnvelope) -> Self {
        MockResponse::literal(envelope)
    }
}

#[derive(Debug, Clone)]
pub struct HttpMock {
    pub url: MockUrl,
    pub method: HttpMethod,
    /// `None` answers 200 with an empty body
    pub response: Option<HttpResponse>,
}

impl HttpMock {
    pub fn new(method: HttpMethod, url: impl Into<MockUrl>) -> Self {
        Self {
            url: url.into(),
            method,
            response: None,
        }
    }

    pub fn get(url: impl Into<MockUrl>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<MockUrl>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<MockUrl>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: impl Into<MockUrl>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn patch(url: impl Into<MockUrl>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    pub fn response(mut self, response: impl Into<HttpResponse>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn respond_with<F>(self, f: F) -> Self
    where
        F: Fn(HttpFacts) -> ResponseEnvelope + Send + Sync + 'static,
    {
        self.response(MockResponse::from_fn(f))
    }

    pub fn respond_with_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HttpFacts) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResponseEnvelope> + Send + 'static,
    {
        self.response(MockResponse::from_async_fn(f))
    }
}
