//! Response resolution.
//!
//! Every mock declares its response as a [`MockResponse`]: a literal value or
//! a sync/async function of the request facts. Resolving it yields an
//! envelope which [`finalize`] turns into the [`MockResult`] handed to the
//! transport.

mod builder;
mod envelope;
mod responder;

pub use builder::HttpResponseBuilder;
pub(crate) use envelope::deserialize_present;
pub use envelope::{finalize, MockResult, ResponseEnvelope};
pub use responder::{AsyncFn, Literal, MockResponse, Responder, SyncFn};
