//! Session state: the `(scenario id, context)` pair.
//!
//! Two interchangeable strategies implement [`SessionState`]:
//!
//! - [`SharedSession`]: one pair owned by a server instance and seen by
//!   every client
//! - [`CookieSession`]: a per-request snapshot read from and written back to
//!   the client's cookie

mod cookie;
mod updater;

pub use cookie::{cookie_value, CookieSession};
pub use updater::{BackgroundTask, ContextUpdater};

use crate::context::{Context, PartialContext};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// The session pair, also the cookie payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPair {
    pub scenario_id: String,
    pub context: Context,
}

impl SessionPair {
    pub fn new(scenario_id: impl Into<String>, context: Context) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            context,
        }
    }
}

/// Capability set shared by both strategies.
///
/// Methods take `&self` so one state can be shared between a request and
/// the background tasks its resolvers start.
pub trait SessionState: Send + Sync {
    fn scenario_id(&self) -> String;

    fn set_scenario_id(&self, scenario_id: String);

    fn context(&self) -> Context;

    fn set_context(&self, context: Context);

    fn snapshot(&self) -> SessionPair {
        SessionPair::new(self.scenario_id(), self.context())
    }

    /// Switch scenario and reset the context to `context`
    fn select(&self, scenario_id: String, context: Context) {
        self.set_scenario_id(scenario_id);
        self.set_context(context);
    }

    /// Merge `partial` over the current context, store and return the result
    fn update_context(&self, partial: &PartialContext) -> Context {
        let updated = partial.apply(&self.context());
        self.set_context(updated.clone());
        updated
    }
}

/// Process-wide pair owned by one server instance.
///
/// `select` and `update_context` hold the write lock for their whole
/// read-modify-write, so a context function passed to `update_context` must
/// not call back into the same session.
#[derive(Debug)]
pub struct SharedSession {
    state: RwLock<SessionPair>,
}

impl SharedSession {
    pub fn new(initial: SessionPair) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }
}

impl SessionState for SharedSession {
    fn scenario_id(&self) -> String {
        self.state.read().scenario_id.clone()
    }

    fn set_scenario_id(&self, scenario_id: String) {
        self.state.write().scenario_id = scenario_id;
    }

    fn context(&self) -> Context {
        self.state.read().context.clone()
    }

    fn set_context(&self, context: Context) {
        self.state.write().context = context;
    }

    fn snapshot(&self) -> SessionPair {
        self.state.read().clone()
    }

    fn select(&self, scenario_id: String, context: Context) {
        let mut state = self.state.write();
        state.scenario_id = scenario_id;
        state.context = context;
    }

    fn update_context(&self, partial: &PartialContext) -> Context {
        let mut state = self.state.write();
        state.context = partial.apply(&state.context);
        state.context.clone()
    }
}
