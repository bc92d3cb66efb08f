//! Scenario definitions and the resolved scenario table.

mod table;

pub use table::{ResolvedScenario, ScenarioTable};

use crate::context::{into_context, Context};
use crate::mock::Mock;
use indexmap::IndexMap;
use serde_json::Value;

/// A named, inheritable bundle of mocks and initial context
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    /// Defaults to the scenario id
    pub name: Option<String>,
    pub description: Option<String>,
    pub context: Context,
    /// Id of the parent scenario
    pub extend: Option<String>,
    pub mocks: Vec<Mock>,
}

impl Scenario {
    pub fn new(mocks: Vec<Mock>) -> Self {
        Self {
            mocks,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Non-object values yield an empty context
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = into_context(context);
        self
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extend = Some(parent.into());
        self
    }

    pub fn with_mock(mut self, mock: impl Into<Mock>) -> Self {
        self.mocks.push(mock.into());
        self
    }
}

/// What a scenario id maps to: a bare mock list or a full scenario
#[derive(Debug, Clone)]
pub enum ScenarioDefinition {
    Mocks(Vec<Mock>),
    Scenario(Scenario),
}

impl ScenarioDefinition {
    fn into_scenario(self) -> Scenario {
        match self {
            ScenarioDefinition::Mocks(mocks) => Scenario::new(mocks),
            ScenarioDefinition::Scenario(scenario) => scenario,
        }
    }
}

impl From<Vec<Mock>> for ScenarioDefinition {
    fn from(mocks: Vec<Mock>) -> Self {
        ScenarioDefinition::Mocks(mocks)
    }
}

impl From<Scenario> for ScenarioDefinition {
    fn from(scenario: Scenario) -> Self {
        ScenarioDefinition::Scenario(scenario)
    }
}

/// Scenario id -> definition, in declaration order. The first entry is the
/// initially selected scenario.
pub type ScenarioMap = IndexMap<String, ScenarioDefinition>;
