//! Mock definitions and the per-scenario mock table.
//!
//! - `http`: HTTP mocks (`url` + `method` + response)
//! - `graphql`: GraphQL mocks (`url` + schema + named query/mutation resolvers)
//! - `table`: splitting an inherited mock list into the effective HTTP route
//!   table and GraphQL table

mod graphql;
mod http;
mod table;

pub use graphql::{
    GraphQlEnvelope, GraphQlError, GraphQlErrorLocation, GraphQlFacts, GraphQlMock,
    GraphQlResolver, OperationKind,
};
pub use http::{HttpFacts, HttpMethod, HttpMock, HttpResponse, MockUrl};
pub use table::{get_graphql_mocks, get_http_mocks, HttpRoute, MockTable};

/// A declarative mock rule
#[derive(Debug, Clone)]
pub enum Mock {
    Http(HttpMock),
    GraphQl(GraphQlMock),
}

impl Mock {
    pub fn url(&self) -> String {
        match self {
            Mock::Http(mock) => mock.url.key(),
            Mock::GraphQl(mock) => mock.url.clone(),
        }
    }
}

impl From<HttpMock> for Mock {
    fn from(mock: HttpMock) -> Self {
        Mock::Http(mock)
    }
}

impl From<GraphQlMock> for Mock {
    fn from(mock: GraphQlMock) -> Self {
        Mock::GraphQl(mock)
    }
}
