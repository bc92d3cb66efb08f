//! Field dispatch and response composition.

use super::operation::select_operation;
use super::request::GraphQlRequest;
use crate::error::RequestError;
use crate::mock::{GraphQlEnvelope, GraphQlError, GraphQlFacts, GraphQlMock};
use crate::request::MockRequest;
use crate::response::{finalize, MockResult, ResponseEnvelope};
use crate::session::ContextUpdater;
use futures::future::try_join_all;
use serde_json::{json, Value};
use tracing::debug;

/// One selected field after its resolver and data graph have settled
struct ResolvedField {
    envelope: GraphQlEnvelope,
    data: Option<Value>,
}

/// Answer a request addressed to a registered GraphQL mock.
///
/// Validation failures come back as `Ok` results with a client status.
/// Errors raised by resolvers are returned as `Err` untouched.
pub async fn handle_graphql_request(
    request: &MockRequest,
    mock: &GraphQlMock,
    update_context: &ContextUpdater,
) -> anyhow::Result<MockResult> {
    let graphql = GraphQlRequest::from_request(request);

    let operation = match select_operation(&graphql.query, graphql.operation_name.as_deref()) {
        Ok(operation) => operation,
        Err(err) => {
            debug!("Rejected GraphQL request on {}: {}", mock.url, err);
            return Ok(err.into_result());
        }
    };

    debug!(
        "GraphQL {} {} on {}: fields {:?}",
        operation.kind,
        operation.name.as_deref().unwrap_or("<anonymous>"),
        mock.url,
        operation.fields
    );

    let resolvers = mock.resolvers(operation.kind);
    let mut selected = Vec::with_capacity(operation.fields.len());
    for field in &operation.fields {
        match resolvers.get(field) {
            Some(resolver) => selected.push(resolver.clone()),
            None => {
                let err = RequestError::UnknownField {
                    operation: operation.kind.to_string(),
                    field: field.clone(),
                };
                debug!("{}", err);
                return Ok(err.into_result());
            }
        }
    }

    let facts = GraphQlFacts {
        operation_kind: operation.kind,
        operation_name: operation.name.clone().unwrap_or_default(),
        variables: graphql.variables,
        context: update_context.current(),
        update_context: update_context.clone(),
    };

    let fields = try_join_all(selected.iter().map(|resolver| {
        let facts = facts.clone();
        async move {
            let envelope = resolver.resolve(facts.clone()).await?;
            let data = match &envelope.data {
                Some(graph) => Some(graph.resolve(facts).await?),
                None => None,
            };
            Ok::<_, anyhow::Error>(ResolvedField { envelope, data })
        }
    }))
    .await?;

    Ok(finalize(compose(fields)?).await)
}

/// Combine the per-field envelopes into one response.
///
/// - data objects are deep-merged, any other data replaces what came before
/// - errors accumulate under the body's `errors` key
/// - the highest status and the longest delay win
/// - headers merge in field order; a later field replaces an earlier header
///   of the same name in any letter case
fn compose(fields: Vec<ResolvedField>) -> anyhow::Result<ResponseEnvelope> {
    let mut composed = ResponseEnvelope::empty();
    let mut errors: Vec<GraphQlError> = Vec::new();

    for ResolvedField { envelope, data } in fields {
        if let Some(value) = data {
            composed.data = Some(match composed.data.take() {
                Some(existing) => deep_merge(existing, value),
                None => value,
            });
        }
        composed.status = composed.status.max(envelope.status);
        composed.delay = composed.delay.max(envelope.delay);
        for (name, value) in envelope.headers {
            composed
                .headers
                .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            composed.headers.insert(name, value);
        }
        errors.extend(envelope.errors);
    }

    if !errors.is_empty() {
        let mut errors = match serde_json::to_value(errors)? {
            Value::Array(errors) => errors,
            other => vec![other],
        };
        composed.data = Some(match composed.data.take() {
            Some(Value::Object(mut body)) => {
                if let Some(Value::Array(existing)) = body.remove("errors") {
                    errors.splice(0..0, existing);
                }
                body.insert("errors".to_string(), Value::Array(errors));
                Value::Object(body)
            }
            None | Some(Value::Null) => json!({ "errors": errors }),
            Some(other) => json!({ "data": other, "errors": errors }),
        });
    }

    Ok(composed)
}

fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::into_context;
    use crate::graphql::ResolverValue;
    use serde_json::json;
    use std::time::Duration;

    fn post(body: Value) -> MockRequest {
        MockRequest::new("POST", "/api/graphql").with_json(body)
    }

    fn person_mock() -> GraphQlMock {
        GraphQlMock::new("/api/graphql", "type Query { firstName: String }")
            .query(
                "firstName",
                GraphQlEnvelope::data(json!({"data": {"firstName": "Alan"}})),
            )
            .query(
                "lastName",
                GraphQlEnvelope::data(json!({"data": {"lastName": "Turing"}})),
            )
            .mutation(
                "firstName",
                GraphQlEnvelope::data(json!({"data": {"firstName": "Mutated"}})),
            )
    }

    #[tokio::test]
    async fn test_query_resolves_literal_envelope() {
        let updater = ContextUpdater::detached(Default::default());
        let result = handle_graphql_request(
            &post(json!({"query": "query Person { firstName }"})),
            &person_mock(),
            &updater,
        )
        .await
        .unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.header("content-type"), Some("application/json"));
        assert_eq!(
            result.response,
            Some(json!({"data": {"firstName": "Alan"}}))
        );
    }

    #[tokio::test]
    async fn test_mutation_dispatches_to_mutations() {
        let updater = ContextUpdater::detached(Default::default());
        let result = handle_graphql_request(
            &post(json!({"query": "mutation Rename { firstName }"})),
            &person_mock(),
            &updater,
        )
        .await
        .unwrap();
        assert_eq!(
            result.response,
            Some(json!({"data": {"firstName": "Mutated"}}))
        );

        let result = handle_graphql_request(
            &post(json!({"query": "mutation Rename { lastName }"})),
            &person_mock(),
            &updater,
        )
        .await
        .unwrap();
        assert_eq!(result.status, 404);
        assert_eq!(
            result.response,
            Some(json!({"message": "No mutation mock for field \"lastName\""}))
        );
    }

    #[tokio::test]
    async fn test_multiple_fields_are_merged() {
        let updater = ContextUpdater::detached(Default::default());
        let result = handle_graphql_request(
            &post(json!({"query": "{ firstName lastName }"})),
            &person_mock(),
            &updater,
        )
        .await
        .unwrap();
        assert_eq!(
            result.response,
            Some(json!({"data": {"firstName": "Alan", "lastName": "Turing"}}))
        );
    }

    #[tokio::test]
    async fn test_validation_errors_are_client_results() {
        let updater = ContextUpdater::detached(Default::default());
        let mock = person_mock();

        let result = handle_graphql_request(&post(json!({"query": "{"})), &mock, &updater)
            .await
            .unwrap();
        assert_eq!(result.status, 400);
        assert_eq!(
            result.response,
            Some(json!({"message": "query \"{\" is not a valid GraphQL query"}))
        );

        let query = "query A { firstName } query B { lastName }";
        let result = handle_graphql_request(&post(json!({"query": query})), &mock, &updater)
            .await
            .unwrap();
        assert_eq!(result.status, 400);
        assert_eq!(
            result.response,
            Some(json!({"message": format!("operationName required for query \"{query}\"")}))
        );

        let result = handle_graphql_request(
            &post(json!({"query": query, "operationName": "Person"})),
            &mock,
            &updater,
        )
        .await
        .unwrap();
        assert_eq!(
            result.response,
            Some(json!({"message": "Operation Person could not be found"}))
        );
    }

    #[tokio::test]
    async fn test_resolver_function_sees_facts_and_updates_context() {
        let updater = ContextUpdater::detached(into_context(json!({"count": 1})));
        let mock = GraphQlMock::new("/api/graphql", "").mutation_with("increment", |facts| {
            let step = facts
                .variables
                .get("step")
                .and_then(Value::as_i64)
                .unwrap_or(1);
            let count = facts.context.get("count").and_then(Value::as_i64);
            let count = count.unwrap_or(0);
            let updated = facts.update_context.update(json!({"count": count + step}));
            GraphQlEnvelope::data(json!({
                "data": {
                    "increment": updated["count"],
                    "operation": facts.operation_name,
                }
            }))
        });

        let result = handle_graphql_request(
            &post(json!({
                "query": "mutation Increment($step: Int) { increment(step: $step) }",
                "variables": {"step": 5}
            })),
            &mock,
            &updater,
        )
        .await
        .unwrap();
        assert_eq!(
            result.response,
            Some(json!({"data": {"increment": 6, "operation": "Increment"}}))
        );
        assert_eq!(updater.current().get("count"), Some(&json!(6)));
    }

    #[tokio::test]
    async fn test_errors_status_and_deferred_data() {
        let updater = ContextUpdater::detached(Default::default());
        let mock = GraphQlMock::new("/api/graphql", "")
            .query(
                "user",
                GraphQlEnvelope::data(ResolverValue::object([(
                    "data",
                    ResolverValue::object([(
                        "user",
                        ResolverValue::deferred(|_| async { json!({"name": "Ada"}) }),
                    )]),
                )])),
            )
            .query(
                "broken",
                GraphQlEnvelope::default()
                    .with_status(500)
                    .with_header("X-Failed", "broken")
                    .with_error(GraphQlError::new("Something went wrong")),
            );

        let result = handle_graphql_request(
            &post(json!({"query": "{ user { name } broken }"})),
            &mock,
            &updater,
        )
        .await
        .unwrap();
        assert_eq!(result.status, 500);
        assert_eq!(result.header("x-failed"), Some("broken"));
        assert_eq!(
            result.response,
            Some(json!({
                "data": {"user": {"name": "Ada"}},
                "errors": [{"message": "Something went wrong"}]
            }))
        );
    }

    #[tokio::test]
    async fn test_errors_without_data() {
        let updater = ContextUpdater::detached(Default::default());
        let mock = GraphQlMock::new("/api/graphql", "").query(
            "broken",
            GraphQlEnvelope::data(Value::Null).with_error(GraphQlError::new("nope")),
        );
        let result = handle_graphql_request(&post(json!({"query": "{ broken }"})), &mock, &updater)
            .await
            .unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(
            result.response,
            Some(json!({"errors": [{"message": "nope"}]}))
        );
    }

    #[tokio::test]
    async fn test_resolver_errors_propagate() {
        let updater = ContextUpdater::detached(Default::default());
        let mock = GraphQlMock::new("/api/graphql", "").query(
            "boom",
            crate::mock::GraphQlResolver::try_from_fn(|_| anyhow::bail!("resolver exploded")),
        );
        let err = handle_graphql_request(&post(json!({"query": "{ boom }"})), &mock, &updater)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "resolver exploded");
    }

    #[tokio::test(start_paused = true)]
    async fn test_longest_delay_wins() {
        let updater = ContextUpdater::detached(Default::default());
        let mock = GraphQlMock::new("/api/graphql", "")
            .query("a", GraphQlEnvelope::data(json!({"a": 1})).with_delay(100))
            .query("b", GraphQlEnvelope::data(json!({"b": 2})).with_delay(300));

        let start = tokio::time::Instant::now();
        let result = handle_graphql_request(&post(json!({"query": "{ a b }"})), &mock, &updater)
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(result.response, Some(json!({"a": 1, "b": 2})));
    }

    #[tokio::test]
    async fn test_later_field_header_wins_regardless_of_case() {
        let updater = ContextUpdater::detached(Default::default());
        let mock = GraphQlMock::new("/api/graphql", "")
            .query(
                "a",
                GraphQlEnvelope::data(json!({"data": {"a": 1}}))
                    .with_header("Content-Type", "text/plain"),
            )
            .query(
                "b",
                GraphQlEnvelope::data(json!({"data": {"b": 2}}))
                    .with_header("content-type", "application/xml"),
            );
        let result = handle_graphql_request(&post(json!({"query": "{ a b }"})), &mock, &updater)
            .await
            .unwrap();

        let content_types: Vec<&String> = result
            .headers
            .keys()
            .filter(|name| name.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(result.header("content-type"), Some("application/xml"));
    }

    #[test]
    fn test_deep_merge() {
        let merged = deep_merge(
            json!({"data": {"a": 1, "nested": {"x": 1}}}),
            json!({"data": {"b": 2, "nested": {"y": 2}}}),
        );
        assert_eq!(
            merged,
            json!({"data": {"a": 1, "b": 2, "nested": {"x": 1, "y": 2}}})
        );
        assert_eq!(
            deep_merge(json!({"a": 1}), json!("scalar")),
            json!("scalar")
        );
    }
}
