//! Scenario-driven HTTP and GraphQL mock server.
//!
//! Scenarios are named sets of mocks that can extend one another. A session
//! pairs the selected scenario with a mutable context, held either in server
//! memory or in a per-client cookie.

pub mod config;
pub mod context;
pub mod error;
pub mod graphql;
pub mod matcher;
pub mod metrics;
pub mod mock;
pub mod request;
pub mod response;
pub mod scenario;
pub mod server;
pub mod session;

pub use config::{Config, ServerOptions};
pub use context::{Context, PartialContext};
pub use error::{ConfigError, RequestError};
pub use mock::{GraphQlEnvelope, GraphQlMock, HttpMock, Mock};
pub use request::MockRequest;
pub use response::{MockResult, ResponseEnvelope};
pub use scenario::{Scenario, ScenarioMap, ScenarioTable};
pub use server::{MockHttpServer, MockServer};
pub use session::{BackgroundTask, ContextUpdater, SessionPair, SessionState};
