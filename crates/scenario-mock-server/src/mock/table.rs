//! Effective mock tables.
//!
//! Input mock lists arrive in ancestor -> descendant order, so "later wins"
//! is "descendant wins".

use super::{GraphQlMock, HttpMock, Mock};
use crate::error::ConfigError;
use crate::matcher::PathMatcher;
use indexmap::IndexMap;

/// An HTTP mock with its compiled url matcher
#[derive(Debug, Clone)]
pub struct HttpRoute {
    pub mock: HttpMock,
    pub matcher: PathMatcher,
}

impl HttpRoute {
    pub fn new(mock: HttpMock) -> Result<Self, ConfigError> {
        let matcher =
            PathMatcher::compile(&mock.url).map_err(|source| ConfigError::InvalidUrlPattern {
                url: mock.url.key(),
                source,
            })?;
        Ok(Self { mock, matcher })
    }
}

/// Keep at most one HTTP mock per `(url, method)`, the last one declared.
///
/// A replaced entry keeps the position of the first declaration for that
/// pair, so registration order is stable across overrides.
pub fn get_http_mocks(mocks: &[Mock]) -> Vec<HttpMock> {
    let mut by_route: IndexMap<String, HttpMock> = IndexMap::new();
    for mock in mocks {
        if let Mock::Http(http) = mock {
            by_route.insert(format!("{}{}", http.url.key(), http.method), http.clone());
        }
    }
    by_route.into_values().collect()
}

/// Keep at most one GraphQL mock per url, merging `types`, `queries` and
/// `mutations` entry by entry so later declarations override single
/// operations and inherit the rest. The first declaration's schema is kept.
pub fn get_graphql_mocks(mocks: &[Mock]) -> Vec<GraphQlMock> {
    let mut by_url: IndexMap<String, GraphQlMock> = IndexMap::new();
    for mock in mocks {
        let Mock::GraphQl(graphql) = mock else {
            continue;
        };
        let merged = by_url
            .entry(graphql.url.clone())
            .or_insert_with(|| GraphQlMock::new(graphql.url.clone(), graphql.schema.clone()));

        for (name, value) in &graphql.types {
            merged.types.insert(name.clone(), value.clone());
        }
        for (name, resolver) in &graphql.queries {
            merged.queries.insert(name.clone(), resolver.clone());
        }
        for (name, resolver) in &graphql.mutations {
            merged.mutations.insert(name.clone(), resolver.clone());
        }
    }
    by_url.into_values().collect()
}

/// The effective HTTP route table and GraphQL table of one scenario
#[derive(Debug, Clone, Default)]
pub struct MockTable {
    http: Vec<HttpRoute>,
    graphql: Vec<GraphQlMock>,
}

impl MockTable {
    /// Build from an inherited mock list (ancestor -> descendant order)
    pub fn build(mocks: &[Mock]) -> Result<Self, ConfigError> {
        let http = get_http_mocks(mocks)
            .into_iter()
            .map(HttpRoute::new)
            .collect::<Result<Vec<_>, _>>()?;

        let graphql = get_graphql_mocks(mocks);
        for mock in &graphql {
            validate_schema(mock)?;
        }

        Ok(Self { http, graphql })
    }

    pub fn http_routes(&self) -> &[HttpRoute] {
        &self.http
    }

    pub fn graphql_mocks(&self) -> &[GraphQlMock] {
        &self.graphql
    }

    /// The GraphQL mock registered for exactly `path`
    pub fn graphql_mock(&self, path: &str) -> Option<&GraphQlMock> {
        self.graphql.iter().find(|mock| mock.url == path)
    }
}

fn validate_schema(mock: &GraphQlMock) -> Result<(), ConfigError> {
    if mock.schema.trim().is_empty() {
        return Ok(());
    }
    graphql_parser::parse_schema::<String>(&mock.schema)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSchema {
            url: mock.url.clone(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{GraphQlEnvelope, HttpMethod, OperationKind};
    use crate::response::ResponseEnvelope;
    use serde_json::json;

    async fn literal_data(mock: &HttpMock) -> serde_json::Value {
        // Literal responses ignore their input, so any facts will do
        let facts = crate::mock::HttpFacts {
            method: mock.method.to_string(),
            path: String::new(),
            query: Default::default(),
            params: Default::default(),
            headers: Default::default(),
            body: json!({}),
            context: Default::default(),
            update_context: crate::session::ContextUpdater::detached(Default::default()),
        };
        let envelope = mock
            .response
            .as_ref()
            .unwrap()
            .resolve(facts)
            .await
            .unwrap();
        envelope.data.unwrap()
    }

    #[tokio::test]
    async fn test_http_keep_last_per_route_and_method() {
        let mocks: Vec<Mock> = vec![
            HttpMock::get("/test-me")
                .response(ResponseEnvelope::data(json!({})))
                .into(),
            HttpMock::post("/test-me")
                .response(ResponseEnvelope::data(json!({"post": "mail"})))
                .into(),
            HttpMock::get("/other").into(),
            HttpMock::get("/test-me")
                .response(ResponseEnvelope::data(json!({"something": "new"})))
                .into(),
        ];

        let http = get_http_mocks(&mocks);
        assert_eq!(http.len(), 3);
        assert_eq!(http[0].url.key(), "/test-me");
        assert_eq!(http[0].method, HttpMethod::Get);
        assert_eq!(literal_data(&http[0]).await, json!({"something": "new"}));
        assert_eq!(http[1].method, HttpMethod::Post);
        assert_eq!(http[2].url.key(), "/other");
    }

    #[test]
    fn test_graphql_merges_operations_per_url() {
        let mocks: Vec<Mock> = vec![
            GraphQlMock::new("/graphql", "type Query { a: String }")
                .query("a", GraphQlEnvelope::data(json!("parent-a")))
                .query("b", GraphQlEnvelope::data(json!("parent-b")))
                .mutation("m", GraphQlEnvelope::data(json!("parent-m")))
                .into(),
            HttpMock::get("/graphql").into(),
            GraphQlMock::new("/other-graphql", "").into(),
            GraphQlMock::new("/graphql", "")
                .query("b", GraphQlEnvelope::data(json!("child-b")))
                .type_default("User", json!({"name": "Bob"}))
                .into(),
        ];

        let graphql = get_graphql_mocks(&mocks);
        assert_eq!(graphql.len(), 2);

        let merged = &graphql[0];
        assert_eq!(merged.url, "/graphql");
        assert_eq!(merged.schema, "type Query { a: String }");
        assert_eq!(
            merged
                .resolvers(OperationKind::Query)
                .keys()
                .collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(merged.mutations.contains_key("m"));
        assert!(merged.types.contains_key("User"));
        assert_eq!(graphql[1].url, "/other-graphql");
    }

    #[tokio::test]
    async fn test_graphql_descendant_overrides_single_operation() {
        let mocks: Vec<Mock> = vec![
            GraphQlMock::new("/graphql", "")
                .query("a", GraphQlEnvelope::data(json!("parent-a")))
                .query("b", GraphQlEnvelope::data(json!("parent-b")))
                .into(),
            GraphQlMock::new("/graphql", "")
                .query("b", GraphQlEnvelope::data(json!("child-b")))
                .into(),
        ];
        let merged = get_graphql_mocks(&mocks).remove(0);
        let facts = crate::mock::GraphQlFacts {
            operation_kind: OperationKind::Query,
            operation_name: String::new(),
            variables: Default::default(),
            context: Default::default(),
            update_context: crate::session::ContextUpdater::detached(Default::default()),
        };

        let b = merged.queries["b"].resolve(facts.clone()).await.unwrap();
        let b = b.data.unwrap().resolve(facts.clone()).await.unwrap();
        assert_eq!(b, json!("child-b"));

        let a = merged.queries["a"].resolve(facts.clone()).await.unwrap();
        let a = a.data.unwrap().resolve(facts).await.unwrap();
        assert_eq!(a, json!("parent-a"));
    }

    #[test]
    fn test_build_rejects_invalid_url_pattern() {
        let mocks: Vec<Mock> = vec![HttpMock::get("/items/:id(\\d+").into()];
        let err = MockTable::build(&mocks).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrlPattern { .. }));
    }

    #[test]
    fn test_build_rejects_invalid_schema() {
        let mocks: Vec<Mock> = vec![GraphQlMock::new("/graphql", "type Query {").into()];
        let err = MockTable::build(&mocks).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSchema { .. }));
    }

    #[test]
    fn test_graphql_mock_lookup_is_exact() {
        let mocks: Vec<Mock> = vec![GraphQlMock::new("/api/graphql", "").into()];
        let table = MockTable::build(&mocks).unwrap();
        assert!(table.graphql_mock("/api/graphql").is_some());
        assert!(table.graphql_mock("/api/graphql/").is_none());
        assert!(table.graphql_mock("/api").is_none());
    }
}
