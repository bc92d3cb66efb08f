//! Scenario context: a flat key/value map visible to resolvers.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Mutable key/value state visible to resolvers, scoped per session.
///
/// Merges are always shallow: only top-level keys are replaced.
pub type Context = Map<String, Value>;

type ContextFn = dyn Fn(&Context) -> Context + Send + Sync;

/// Argument to `updateContext`: either literal values or a function of the
/// current context. In both cases the produced map is shallow-merged over the
/// current context.
#[derive(Clone)]
pub enum PartialContext {
    Values(Context),
    Function(Arc<ContextFn>),
}

impl PartialContext {
    /// Build a partial update from a function of the current context
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Context + Send + Sync + 'static,
    {
        PartialContext::Function(Arc::new(f))
    }

    /// Produce the new context for `current`
    pub fn apply(&self, current: &Context) -> Context {
        match self {
            PartialContext::Values(values) => merge_context(current, values),
            PartialContext::Function(f) => merge_context(current, &f(current)),
        }
    }
}

impl fmt::Debug for PartialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialContext::Values(values) => f.debug_tuple("Values").field(values).finish(),
            PartialContext::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<Context> for PartialContext {
    fn from(values: Context) -> Self {
        PartialContext::Values(values)
    }
}

/// Non-object values carry no keys and therefore update nothing.
impl From<Value> for PartialContext {
    fn from(value: Value) -> Self {
        PartialContext::Values(into_context(value))
    }
}

/// Shallow merge: keys of `overlay` replace same-named keys of `base`.
pub fn merge_context(base: &Context, overlay: &Context) -> Context {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Take the top-level map of a JSON object; anything else yields an empty context.
pub fn into_context(value: Value) -> Context {
    match value {
        Value::Object(map) => map,
        _ => Context::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_is_shallow() {
        let base = into_context(json!({
            "name": "Alice",
            "address": {"city": "Leeds", "zip": "LS1"}
        }));
        let overlay = into_context(json!({"address": {"city": "York"}}));

        let merged = merge_context(&base, &overlay);
        assert_eq!(
            Value::Object(merged),
            json!({"name": "Alice", "address": {"city": "York"}})
        );
    }

    #[test]
    fn test_partial_values_keep_other_keys() {
        let current = into_context(json!({"name": "Dean", "age": 40}));
        let partial = PartialContext::from(json!({"name": "Elle"}));
        assert_eq!(
            Value::Object(partial.apply(&current)),
            json!({"name": "Elle", "age": 40})
        );
    }

    #[test]
    fn test_partial_function_result_is_merged() {
        let current = into_context(json!({"name": "Betty", "age": 40}));
        let partial = PartialContext::from_fn(|ctx| {
            let age = ctx.get("age").and_then(Value::as_i64).unwrap_or(0);
            into_context(json!({"age": age + 1}))
        });
        assert_eq!(
            Value::Object(partial.apply(&current)),
            json!({"name": "Betty", "age": 41})
        );
    }

    #[test]
    fn test_non_object_value_updates_nothing() {
        let current = into_context(json!({"a": 1}));
        let partial = PartialContext::from(json!("not an object"));
        assert_eq!(partial.apply(&current), current);
    }
}
