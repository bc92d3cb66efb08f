//! Error taxonomy for the mock server.
//!
//! `ConfigError` is fatal and only produced while building the scenario table
//! or loading configuration. `RequestError` is per-request and always turned
//! into a `MockResult` with a client-facing message.

use crate::response::MockResult;
use serde_json::json;
use thiserror::Error;

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No scenarios defined")]
    EmptyScenarioTable,
    #[error("Scenario \"{scenario}\" extends unknown scenario \"{extend}\"")]
    UnknownExtend { scenario: String, extend: String },
    #[error("Scenario extend chain is cyclic: {}", chain.join(" -> "))]
    CyclicExtend { chain: Vec<String> },
    #[error("Scenario \"{0}\" does not exist")]
    UnknownScenario(String),
    #[error("Invalid url pattern \"{url}\": {source}")]
    InvalidUrlPattern {
        url: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid GraphQL schema for \"{url}\": {message}")]
    InvalidSchema { url: String, message: String },
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Per-request errors surfaced to the client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("query \"{0}\" is not a valid GraphQL query")]
    InvalidQuery(String),
    #[error("operationName required for query \"{0}\"")]
    OperationNameRequired(String),
    #[error("Operation {0} could not be found")]
    OperationNotFound(String),
    #[error("Only field selections are supported, found {0}")]
    UnsupportedSelection(String),
    #[error("{0} operations are not supported")]
    UnsupportedOperation(String),
    #[error("No {operation} mock for field \"{field}\"")]
    UnknownField { operation: String, field: String },
    #[error("Scenario id \"{0}\" does not exist")]
    ScenarioNotFound(String),
    #[error("scenarioId is required")]
    MissingScenarioId,
}

impl RequestError {
    /// HTTP status this error is reported with
    pub fn status(&self) -> u16 {
        match self {
            RequestError::UnknownField { .. } => 404,
            _ => 400,
        }
    }

    /// Convert into the JSON `{ "message": ... }` result handed to the transport
    pub fn into_result(self) -> MockResult {
        MockResult::json(self.status(), json!({ "message": self.to_string() }))
    }
}

impl From<RequestError> for MockResult {
    fn from(err: RequestError) -> Self {
        err.into_result()
    }
}
