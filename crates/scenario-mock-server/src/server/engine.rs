//! Request dispatch, scenario selection and scenario listing.

use crate::config::ServerOptions;
use crate::error::{ConfigError, RequestError};
use crate::graphql::handle_graphql_request;
use crate::matcher::find_http_route;
use crate::metrics::{record_request, record_selection};
use crate::mock::{HttpFacts, HttpRoute};
use crate::request::MockRequest;
use crate::response::{finalize, MockResult, ResponseEnvelope};
use crate::scenario::{ScenarioMap, ScenarioTable};
use crate::session::{
    cookie_value, ContextUpdater, CookieSession, SessionPair, SessionState, SharedSession,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Session state serving one request
#[derive(Clone)]
pub struct Session {
    state: Arc<dyn SessionState>,
    cookie: Option<Arc<CookieSession>>,
}

impl Session {
    pub fn snapshot(&self) -> SessionPair {
        self.state.snapshot()
    }

    pub fn updater(&self) -> ContextUpdater {
        ContextUpdater::new(Arc::clone(&self.state))
    }

    /// `Set-Cookie` value to send back, in cookie mode only
    pub fn set_cookie(&self, cookie_name: &str) -> Option<String> {
        self.cookie
            .as_ref()
            .map(|cookie| cookie.set_cookie_header(cookie_name))
    }
}

/// Entry of the scenario listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub selected: bool,
}

/// The mock engine: an immutable scenario table plus the server's own
/// shared session. Independent instances never share state.
pub struct MockServer {
    table: ScenarioTable,
    options: ServerOptions,
    shared: Arc<SharedSession>,
}

impl MockServer {
    pub fn new(scenarios: ScenarioMap, options: ServerOptions) -> Result<Self, ConfigError> {
        let table = ScenarioTable::build(scenarios)?;
        let shared = Arc::new(SharedSession::new(table.initial_session()));
        info!(
            "Mock server ready: {} scenarios, initial scenario \"{}\", cookie mode {}",
            table.len(),
            table.initial().id,
            options.cookie_mode
        );
        Ok(Self {
            table,
            options,
            shared,
        })
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn table(&self) -> &ScenarioTable {
        &self.table
    }

    /// Session for a request carrying `cookie_header`.
    ///
    /// Shared mode ignores the header and hands out the server's session.
    pub fn session(&self, cookie_header: Option<&str>) -> Session {
        if !self.options.cookie_mode {
            return Session {
                state: self.shared.clone(),
                cookie: None,
            };
        }

        let raw = cookie_header.and_then(|header| cookie_value(header, &self.options.cookie_name));
        let cookie = Arc::new(CookieSession::from_cookie(raw, &self.table));
        Session {
            state: cookie.clone(),
            cookie: Some(cookie),
        }
    }

    /// Resolve a request against the session's active scenario.
    ///
    /// A path registered as a GraphQL mock is always handled as GraphQL.
    /// Otherwise the first matching HTTP route answers. Nothing matching is
    /// a 404 with an empty body.
    pub async fn handle_request(
        &self,
        request: &MockRequest,
        session: &Session,
    ) -> anyhow::Result<MockResult> {
        let scenario_id = session.state.scenario_id();
        let scenario = match self.table.get(&scenario_id) {
            Some(scenario) => scenario,
            None => {
                warn!(
                    "Unknown active scenario {}, using initial scenario",
                    scenario_id
                );
                self.table.initial()
            }
        };
        let updater = session.updater();

        if let Some(mock) = scenario.mocks.graphql_mock(&request.path) {
            debug!(
                "{} {} -> GraphQL mock ({})",
                request.method, request.path, scenario.id
            );
            let result = handle_graphql_request(request, mock, &updater).await?;
            record_request("graphql", result.status);
            return Ok(result);
        }

        if let Some((route, params)) =
            find_http_route(&request.method, &request.path, scenario.mocks.http_routes())
        {
            debug!(
                "{} {} -> HTTP mock {} ({})",
                request.method,
                request.path,
                route.mock.url.key(),
                scenario.id
            );
            let result = resolve_http_mock(request, route, params, updater).await?;
            record_request("http", result.status);
            return Ok(result);
        }

        debug!(
            "{} {} -> no mock in scenario {}",
            request.method, request.path, scenario.id
        );
        record_request("unmatched", 404);
        Ok(MockResult::status(404))
    }

    /// Switch the session to `scenario_id`, resetting its context
    pub fn select_scenario(&self, scenario_id: &str, session: &Session) -> MockResult {
        let Some(scenario) = self.table.get(scenario_id) else {
            warn!("Cannot select unknown scenario {}", scenario_id);
            record_selection(false);
            return RequestError::ScenarioNotFound(scenario_id.to_string()).into_result();
        };

        session
            .state
            .select(scenario.id.clone(), scenario.context.clone());
        record_selection(true);
        info!("Selected scenario {}", scenario.id);
        MockResult::status(204)
    }

    /// Scenarios in declaration order, flagging the session's active one
    pub fn scenario_summaries(&self, session: &Session) -> Vec<ScenarioSummary> {
        let selected = session.state.scenario_id();
        self.table
            .scenarios()
            .map(|scenario| ScenarioSummary {
                id: scenario.id.clone(),
                name: scenario.name.clone(),
                description: scenario.description.clone(),
                selected: scenario.id == selected,
            })
            .collect()
    }

    pub fn list_scenarios(&self, session: &Session) -> MockResult {
        match serde_json::to_value(self.scenario_summaries(session)) {
            Ok(body) => MockResult::json(200, body),
            Err(e) => {
                warn!("Failed to encode scenario list: {}", e);
                MockResult::status(500)
            }
        }
    }
}

async fn resolve_http_mock(
    request: &MockRequest,
    route: &HttpRoute,
    params: HashMap<String, String>,
    update_context: ContextUpdater,
) -> anyhow::Result<MockResult> {
    let Some(response) = &route.mock.response else {
        return Ok(finalize(ResponseEnvelope::empty()).await);
    };

    let facts = HttpFacts {
        method: request.method.clone(),
        path: request.path.clone(),
        query: request.query.clone(),
        params,
        headers: request.headers.clone(),
        body: request.body.as_object_value(),
        context: update_context.current(),
        update_context,
    };

    let envelope = response.resolve(facts).await?;
    Ok(finalize(envelope).await)
}
