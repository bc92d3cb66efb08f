//! GraphQL mock definitions.

use crate::context::Context;
use crate::graphql::ResolverValue;
use crate::response::{deserialize_present, MockResponse};
use crate::session::ContextUpdater;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

/// Kind of the operation selected from a GraphQL document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => f.write_str("query"),
            OperationKind::Mutation => f.write_str("mutation"),
        }
    }
}

/// Facts handed to GraphQL resolver functions and deferred leaves
#[derive(Debug, Clone)]
pub struct GraphQlFacts {
    pub operation_kind: OperationKind,
    /// Name of the selected operation, empty for anonymous operations
    pub operation_name: String,
    pub variables: Map<String, Value>,
    pub context: Context,
    pub update_context: ContextUpdater,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// Entry of a GraphQL `errors` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<GraphQlErrorLocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }
    }
}

/// What a query/mutation resolver produces.
///
/// `data` is the response body as the mock author wants it; it is not
/// wrapped any further.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlEnvelope {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub data: Option<ResolverValue>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub delay: Option<u64>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlEnvelope {
    pub fn data(data: impl Into<ResolverValue>) -> Self {
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

    pub fn with_error(mut self, error: GraphQlError) -> Self {
        self.errors.push(error);
        self
    }
}

pub type GraphQlResolver = MockResponse<GraphQlFacts, GraphQlEnvelope>;

impl From<GraphQlEnvelope> for MockResponse<GraphQlFacts, GraphQlEnvelope> {
    fn from(envelope: GraphQlEnvelope) -> Self {
        MockResponse::literal(envelope)
    }
}

/// A GraphQL endpoint mock.
///
/// `queries` and `mutations` are keyed by top-level field name. `types` is
/// carried through inheritance merging but not consulted during resolution.
#[derive(Debug, Clone)]
pub struct GraphQlMock {
    pub url: String,
    pub schema: String,
    pub types: IndexMap<String, ResolverValue>,
    pub queries: IndexMap<String, GraphQlResolver>,
    pub mutations: IndexMap<String, GraphQlResolver>,
}

impl GraphQlMock {
    pub fn new(url: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            schema: schema.into(),
            types: IndexMap::new(),
            queries: IndexMap::new(),
            mutations: IndexMap::new(),
        }
    }

    pub fn query(mut self, field: impl Into<String>, resolver: impl Into<GraphQlResolver>) -> Self {
        self.queries.insert(field.into(), resolver.into());
        self
    }

    pub fn query_with<F>(self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(GraphQlFacts) -> GraphQlEnvelope + Send + Sync + 'static,
    {
        self.query(field, MockResponse::from_fn(f))
    }

    pub fn query_with_async<F, Fut>(self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(GraphQlFacts) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GraphQlEnvelope> + Send + 'static,
    {
        self.query(field, MockResponse::from_async_fn(f))
    }

    pub fn mutation(
        mut self,
        field: impl Into<String>,
        resolver: impl Into<GraphQlResolver>,
    ) -> Self {
        self.mutations.insert(field.into(), resolver.into());
        self
    }

    pub fn mutation_with<F>(self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(GraphQlFacts) -> GraphQlEnvelope + Send + Sync + 'static,
    {
        self.mutation(field, MockResponse::from_fn(f))
    }

    pub fn mutation_with_async<F, Fut>(self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(GraphQlFacts) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GraphQlEnvelope> + Send + 'static,
    {
        self.mutation(field, MockResponse::from_async_fn(f))
    }

    pub fn type_default(
        mut self,
        type_name: impl Into<String>,
        value: impl Into<ResolverValue>,
    ) -> Self {
        self.types.insert(type_name.into(), value.into());
        self
    }

    /// Resolver map consulted for an operation of `kind`
    pub fn resolvers(&self, kind: OperationKind) -> &IndexMap<String, GraphQlResolver> {
        match kind {
            OperationKind::Query => &self.queries,
            OperationKind::Mutation => &self.mutations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolvers_by_kind() {
        let mock = GraphQlMock::new("/graphql", "")
            .query("user", GraphQlEnvelope::data(json!({"name": "Alan"})))
            .mutation("createUser", GraphQlEnvelope::data(json!({"id": "1"})));

        let queries = mock.resolvers(OperationKind::Query);
        assert!(queries.contains_key("user"));
        assert!(!queries.contains_key("createUser"));
        let mutations = mock.resolvers(OperationKind::Mutation);
        assert!(mutations.contains_key("createUser"));
    }

    #[test]
    fn test_envelope_deserialize() {
        let envelope: GraphQlEnvelope = serde_json::from_value(json!({
            "data": null,
            "status": 500,
            "errors": [{"message": "Something went wrong"}]
        }))
        .unwrap();
        assert!(matches!(envelope.data, Some(ResolverValue::Value(Value::Null))));
        assert_eq!(envelope.status, Some(500));
        assert_eq!(
            envelope.errors,
            vec![GraphQlError::new("Something went wrong")]
        );

        let empty: GraphQlEnvelope = serde_json::from_value(json!({})).unwrap();
        assert!(empty.data.is_none());
    }
}
