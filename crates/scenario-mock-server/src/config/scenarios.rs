//! Scenario file schema.
//!
//! Files only describe literal mocks; response functions and deferred values
//! are only available through the Rust API.

use crate::context::Context;
use crate::graphql::ResolverValue;
use crate::mock::{GraphQlEnvelope, GraphQlMock, HttpMethod, HttpMock, Mock};
use crate::response::ResponseEnvelope;
use crate::scenario::{Scenario, ScenarioDefinition, ScenarioMap};
use indexmap::IndexMap;
use serde::Deserialize;

const GRAPHQL_METHOD: &str = "GRAPHQL";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ScenarioEntry {
    Mocks(Vec<MockEntry>),
    Scenario(ScenarioBody),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScenarioBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    context: Context,
    #[serde(default)]
    extend: Option<String>,
    #[serde(default)]
    mocks: Vec<MockEntry>,
}

/// One mock; `method: GRAPHQL` marks a GraphQL mock
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MockEntry {
    url: String,
    method: String,
    #[serde(default)]
    response: Option<ResponseEnvelope>,
    #[serde(default)]
    schema: String,
    #[serde(default)]
    types: IndexMap<String, ResolverValue>,
    #[serde(default)]
    queries: IndexMap<String, GraphQlEnvelope>,
    #[serde(default)]
    mutations: IndexMap<String, GraphQlEnvelope>,
}

impl MockEntry {
    fn into_mock(self) -> Result<Mock, String> {
        if self.method.eq_ignore_ascii_case(GRAPHQL_METHOD) {
            let mut mock = GraphQlMock::new(self.url, self.schema);
            for (name, value) in self.types {
                mock = mock.type_default(name, value);
            }
            for (field, envelope) in self.queries {
                mock = mock.query(field, envelope);
            }
            for (field, envelope) in self.mutations {
                mock = mock.mutation(field, envelope);
            }
            return Ok(mock.into());
        }

        let method: HttpMethod = self
            .method
            .parse()
            .map_err(|e| format!("mock {}: {}", self.url, e))?;
        let mut mock = HttpMock::new(method, self.url);
        if let Some(response) = self.response {
            mock = mock.response(response);
        }
        Ok(mock.into())
    }
}

fn into_mocks(entries: Vec<MockEntry>) -> Result<Vec<Mock>, String> {
    entries.into_iter().map(MockEntry::into_mock).collect()
}

/// Convert file entries into the scenario map, keeping declaration order
pub(super) fn into_scenario_map(
    entries: IndexMap<String, ScenarioEntry>,
) -> Result<ScenarioMap, String> {
    entries
        .into_iter()
        .map(|(id, entry)| {
            let definition = match entry {
                ScenarioEntry::Mocks(mocks) => ScenarioDefinition::Mocks(into_mocks(mocks)?),
                ScenarioEntry::Scenario(body) => ScenarioDefinition::Scenario(Scenario {
                    name: body.name,
                    description: body.description,
                    context: body.context,
                    extend: body.extend,
                    mocks: into_mocks(body.mocks)?,
                }),
            };
            Ok((id, definition))
        })
        .collect()
}
