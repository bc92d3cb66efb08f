//! Scenario table construction.
//!
//! Everything derived from configuration is computed once here: each
//! scenario's `extend` chain, its merged context and its effective mock
//! table. Nothing in the table changes after `build`.

use super::{Scenario, ScenarioMap};
use crate::context::{merge_context, Context};
use crate::error::ConfigError;
use crate::mock::{Mock, MockTable};
use crate::session::SessionPair;
use indexmap::IndexMap;
use tracing::{debug, info};

/// A scenario with its inheritance resolved
#[derive(Debug, Clone)]
pub struct ResolvedScenario {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub extend: Option<String>,
    /// Ids from the root ancestor down to this scenario
    pub chain: Vec<String>,
    /// Contexts of the chain merged root first, so descendants win
    pub context: Context,
    pub mocks: MockTable,
}

#[derive(Debug, Clone)]
pub struct ScenarioTable {
    scenarios: IndexMap<String, ResolvedScenario>,
}

impl ScenarioTable {
    pub fn build(map: ScenarioMap) -> Result<Self, ConfigError> {
        if map.is_empty() {
            return Err(ConfigError::EmptyScenarioTable);
        }

        let definitions: IndexMap<String, Scenario> = map
            .into_iter()
            .map(|(id, definition)| (id, definition.into_scenario()))
            .collect();

        let mut scenarios = IndexMap::with_capacity(definitions.len());
        for (id, scenario) in &definitions {
            let chain = scenario_ids(id, &definitions)?;

            let context = chain.iter().fold(Context::new(), |merged, ancestor| {
                merge_context(&merged, &definitions[ancestor.as_str()].context)
            });

            let mocks: Vec<Mock> = chain
                .iter()
                .flat_map(|ancestor| definitions[ancestor.as_str()].mocks.iter().cloned())
                .collect();
            let mocks = MockTable::build(&mocks)?;

            debug!(
                "Resolved scenario {} (chain: {}, {} http mocks, {} graphql mocks)",
                id,
                chain.join(" -> "),
                mocks.http_routes().len(),
                mocks.graphql_mocks().len()
            );

            scenarios.insert(
                id.clone(),
                ResolvedScenario {
                    id: id.clone(),
                    name: scenario.name.clone().unwrap_or_else(|| id.clone()),
                    description: scenario.description.clone(),
                    extend: scenario.extend.clone(),
                    chain,
                    context,
                    mocks,
                },
            );
        }

        info!("Built scenario table with {} scenarios", scenarios.len());
        Ok(Self { scenarios })
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedScenario> {
        self.scenarios.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenarios.contains_key(id)
    }

    /// Scenarios in declaration order
    pub fn scenarios(&self) -> impl Iterator<Item = &ResolvedScenario> {
        self.scenarios.values()
    }

    // Never empty: `build` rejects empty tables
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Ancestor -> descendant ids ending with `id`
    pub fn scenario_ids(&self, id: &str) -> Option<&[String]> {
        self.get(id).map(|scenario| scenario.chain.as_slice())
    }

    /// Fully merged context of `id`
    pub fn context_from_scenario(&self, id: &str) -> Option<&Context> {
        self.get(id).map(|scenario| &scenario.context)
    }

    /// The first declared scenario
    pub fn initial(&self) -> &ResolvedScenario {
        // `build` rejects empty tables
        &self.scenarios[0]
    }

    /// Session a client starts with: the first scenario and its context
    pub fn initial_session(&self) -> SessionPair {
        let initial = self.initial();
        SessionPair::new(initial.id.clone(), initial.context.clone())
    }
}

/// Walk `extend` pointers from `id` to the root, rejecting unknown parents
/// and cycles. Returns the chain ancestor first.
fn scenario_ids(
    id: &str,
    scenarios: &IndexMap<String, Scenario>,
) -> Result<Vec<String>, ConfigError> {
    let mut chain = vec![id.to_string()];
    let mut current = id;

    while let Some(parent) = scenarios
        .get(current)
        .and_then(|scenario| scenario.extend.as_deref())
    {
        if !scenarios.contains_key(parent) {
            return Err(ConfigError::UnknownExtend {
                scenario: current.to_string(),
                extend: parent.to_string(),
            });
        }
        let seen = chain.iter().any(|ancestor| ancestor == parent);
        chain.push(parent.to_string());
        if seen {
            return Err(ConfigError::CyclicExtend { chain });
        }
        current = parent;
    }

    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{HttpMethod, HttpMock};
    use crate::response::ResponseEnvelope;
    use crate::scenario::ScenarioDefinition;
    use serde_json::{json, Value};

    fn map(entries: Vec<(&str, ScenarioDefinition)>) -> ScenarioMap {
        entries
            .into_iter()
            .map(|(id, definition)| (id.to_string(), definition))
            .collect()
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let err = ScenarioTable::build(ScenarioMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyScenarioTable));
        assert_eq!(err.to_string(), "No scenarios defined");
    }

    #[test]
    fn test_chain_is_ancestor_first() {
        let table = ScenarioTable::build(map(vec![
            ("root", Scenario::default().into()),
            ("middle", Scenario::default().extending("root").into()),
            ("leaf", Scenario::default().extending("middle").into()),
        ]))
        .unwrap();

        assert_eq!(
            table.scenario_ids("leaf").unwrap(),
            ["root", "middle", "leaf"]
        );
        assert_eq!(table.scenario_ids("root").unwrap(), ["root"]);
        assert!(table.scenario_ids("missing").is_none());
    }

    #[test]
    fn test_unknown_extend_is_rejected() {
        let err = ScenarioTable::build(map(vec![(
            "child",
            Scenario::default().extending("ghost").into(),
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownExtend { ref scenario, ref extend }
                if scenario == "child" && extend == "ghost"
        ));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let err = ScenarioTable::build(map(vec![
            ("a", Scenario::default().extending("b").into()),
            ("b", Scenario::default().extending("a").into()),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Scenario extend chain is cyclic: a -> b -> a"
        );

        let err = ScenarioTable::build(map(vec![(
            "self",
            Scenario::default().extending("self").into(),
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::CyclicExtend { .. }));
    }

    #[test]
    fn test_context_merge_is_leaf_wins() {
        let table = ScenarioTable::build(map(vec![
            (
                "default",
                Scenario::default()
                    .with_context(json!({"name": "Alice", "role": "admin"}))
                    .into(),
            ),
            (
                "test",
                Scenario::default()
                    .extending("default")
                    .with_context(json!({"age": 30, "role": "guest"}))
                    .into(),
            ),
        ]))
        .unwrap();

        assert_eq!(
            Value::Object(table.context_from_scenario("test").unwrap().clone()),
            json!({"name": "Alice", "role": "guest", "age": 30})
        );
        assert_eq!(
            Value::Object(table.context_from_scenario("default").unwrap().clone()),
            json!({"name": "Alice", "role": "admin"})
        );
    }

    #[test]
    fn test_descendant_mock_overrides_ancestor() {
        let table = ScenarioTable::build(map(vec![
            (
                "default",
                vec![
                    HttpMock::get("/user")
                        .response(ResponseEnvelope::data(json!("parent")))
                        .into(),
                    HttpMock::get("/parent-only").into(),
                ]
                .into(),
            ),
            (
                "child",
                Scenario::new(vec![
                    HttpMock::get("/user")
                        .response(ResponseEnvelope::data(json!("child")))
                        .into(),
                    HttpMock::post("/child-only").into(),
                ])
                .extending("default")
                .into(),
            ),
        ]))
        .unwrap();

        let routes = table.get("child").unwrap().mocks.http_routes();
        let keys: Vec<(String, HttpMethod)> = routes
            .iter()
            .map(|route| (route.mock.url.key(), route.mock.method))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("/user".to_string(), HttpMethod::Get),
                ("/parent-only".to_string(), HttpMethod::Get),
                ("/child-only".to_string(), HttpMethod::Post),
            ]
        );
        assert_eq!(table.get("default").unwrap().mocks.http_routes().len(), 2);
    }

    #[test]
    fn test_names_and_initial_scenario() {
        let table = ScenarioTable::build(map(vec![
            ("first", Vec::<Mock>::new().into()),
            (
                "second",
                Scenario::default()
                    .with_name("Second scenario")
                    .with_description("described")
                    .into(),
            ),
        ]))
        .unwrap();

        let names: Vec<&str> = table.scenarios().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "Second scenario"]);
        assert_eq!(table.initial().id, "first");
        assert_eq!(table.initial_session().scenario_id, "first");
        assert_eq!(
            table.get("second").unwrap().description.as_deref(),
            Some("described")
        );
    }
}
