//! Extracting `{query, operationName, variables}` from an incoming request.

use crate::request::{MockRequest, RequestBody};
use serde::Deserialize;
use serde_json::{Map, Value};

const GRAPHQL_CONTENT_TYPE: &str = "application/graphql";

/// The GraphQL parameters of a request, before parsing the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphQlRequest {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: Map<String, Value>,
}

/// JSON body shape. A body with any mistyped field counts as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlBody {
    query: Option<String>,
    operation_name: Option<String>,
    variables: Option<Map<String, Value>>,
}

impl GraphQlBody {
    fn from_request_body(body: &RequestBody) -> Self {
        let value = match body {
            RequestBody::Json(value) => value.clone(),
            RequestBody::Text(text) => match serde_json::from_str(text) {
                Ok(value) => value,
                Err(_) => return Self::default(),
            },
        };
        serde_json::from_value(value).unwrap_or_default()
    }
}

impl GraphQlRequest {
    /// Read the GraphQL parameters from the body, falling back to the query
    /// string. `application/graphql` bodies are taken as the raw document.
    pub fn from_request(request: &MockRequest) -> Self {
        let body = GraphQlBody::from_request_body(&request.body);

        let is_raw_document = request
            .header("content-type")
            .map(|value| value.trim().to_ascii_lowercase())
            .is_some_and(|value| value.starts_with(GRAPHQL_CONTENT_TYPE));

        let query = if is_raw_document {
            match &request.body {
                RequestBody::Text(text) => text.clone(),
                RequestBody::Json(_) => String::new(),
            }
        } else {
            body.query
                .clone()
                .or_else(|| request.query_param("query").map(str::to_string))
                .unwrap_or_default()
        };

        let operation_name = body
            .operation_name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                request
                    .query_param("operationName")
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            });

        let variables = body
            .variables
            .or_else(|| {
                request
                    .query_param("variables")
                    .and_then(|raw| serde_json::from_str(raw).ok())
            })
            .unwrap_or_default();

        Self {
            query,
            operation_name,
            variables,
        }
    }
}
