//! GraphQL request resolution.
//!
//! A request addressed to a registered GraphQL mock goes through:
//!
//! 1. `request`: read `{query, operationName, variables}` from the body or
//!    the query string
//! 2. `operation`: parse the document and select the operation to run
//! 3. `resolve`: look up one resolver per top-level field, resolve them
//!    concurrently and compose the response
//!
//! Only top-level field selections are dispatched. The schema is never used
//! to validate requests.

mod operation;
mod request;
mod resolve;
mod value;

pub use operation::{select_operation, SelectedOperation};
pub use request::GraphQlRequest;
pub use resolve::handle_graphql_request;
pub use value::ResolverValue;
