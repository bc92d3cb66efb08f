//! The mock server: the transport-agnostic [`MockServer`] engine and its
//! hyper binding, [`MockHttpServer`].

mod engine;
mod http;

pub use engine::{MockServer, ScenarioSummary, Session};
pub use http::{decode_body, route_request, translate_request, MockHttpServer};
