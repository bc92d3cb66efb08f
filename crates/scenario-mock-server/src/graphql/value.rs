//! Resolver value graphs.

use crate::mock::GraphQlFacts;
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type DeferredFn =
    dyn Fn(GraphQlFacts) -> BoxFuture<'static, anyhow::Result<ResolverValue>> + Send + Sync;

/// A value graph whose leaves may be computed lazily per request.
///
/// Plain JSON covers literal data. `Object` and `List` let a deferred leaf
/// sit anywhere inside a structure; deferred leaves may themselves produce
/// further graphs.
#[derive(Clone)]
pub enum ResolverValue {
    Value(Value),
    Object(IndexMap<String, ResolverValue>),
    List(Vec<ResolverValue>),
    Deferred(Arc<DeferredFn>),
}

impl ResolverValue {
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ResolverValue>,
    {
        ResolverValue::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn list<V: Into<ResolverValue>>(items: impl IntoIterator<Item = V>) -> Self {
        ResolverValue::List(items.into_iter().map(Into::into).collect())
    }

    /// A leaf computed from the request facts when the response is built
    pub fn deferred<F, Fut, V>(f: F) -> Self
    where
        F: Fn(GraphQlFacts) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
        V: Into<ResolverValue>,
    {
        Self::try_deferred(move |facts| {
            f(facts).map(|value| Ok::<ResolverValue, anyhow::Error>(value.into()))
        })
    }

    pub fn try_deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(GraphQlFacts) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ResolverValue>> + Send + 'static,
    {
        ResolverValue::Deferred(Arc::new(
            move |facts: GraphQlFacts| -> BoxFuture<'static, anyhow::Result<ResolverValue>> {
                f(facts).boxed()
            },
        ))
    }

    /// Resolve the whole graph to plain JSON.
    ///
    /// Siblings are resolved concurrently; the first failing leaf fails the
    /// whole value. Object key order is preserved.
    pub fn resolve(&self, facts: GraphQlFacts) -> BoxFuture<'_, anyhow::Result<Value>> {
        async move {
            match self {
                ResolverValue::Value(value) => Ok(value.clone()),
                ResolverValue::List(items) => {
                    let values =
                        try_join_all(items.iter().map(|item| item.resolve(facts.clone()))).await?;
                    Ok(Value::Array(values))
                }
                ResolverValue::Object(fields) => {
                    let values =
                        try_join_all(fields.values().map(|value| value.resolve(facts.clone())))
                            .await?;
                    Ok(Value::Object(fields.keys().cloned().zip(values).collect()))
                }
                ResolverValue::Deferred(f) => {
                    let produced = f(facts.clone()).await?;
                    produced.resolve(facts).await
                }
            }
        }
        .boxed()
    }
}

impl fmt::Debug for ResolverValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ResolverValue::Object(fields) => f.debug_tuple("Object").field(fields).finish(),
            ResolverValue::List(items) => f.debug_tuple("List").field(items).finish(),
            ResolverValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Value> for ResolverValue {
    fn from(value: Value) -> Self {
        ResolverValue::Value(value)
    }
}

impl From<&str> for ResolverValue {
    fn from(value: &str) -> Self {
        ResolverValue::Value(Value::String(value.to_string()))
    }
}

impl From<String> for ResolverValue {
    fn from(value: String) -> Self {
        ResolverValue::Value(Value::String(value))
    }
}

/// Files can only describe literal graphs
impl<'de> Deserialize<'de> for ResolverValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ResolverValue::Value)
    }
}
