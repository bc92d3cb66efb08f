//! Cookie-backed session snapshots.

use super::{SessionPair, SessionState};
use crate::context::Context;
use crate::scenario::ScenarioTable;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use tracing::debug;

/// A session pair living in one client's cookie.
///
/// Built from the request cookie, mutated while the request is resolved and
/// serialized back onto the response.
#[derive(Debug)]
pub struct CookieSession {
    state: Mutex<SessionPair>,
}

impl CookieSession {
    pub fn new(pair: SessionPair) -> Self {
        Self {
            state: Mutex::new(pair),
        }
    }

    /// Restore the snapshot carried by `raw`.
    ///
    /// Absent, undecodable or stale snapshots (naming a scenario that is not
    /// in `table`) fall back to the initial session.
    pub fn from_cookie(raw: Option<&str>, table: &ScenarioTable) -> Self {
        let restored = raw.and_then(|raw| match Self::decode(raw) {
            Some(pair) if table.contains(&pair.scenario_id) => Some(pair),
            Some(pair) => {
                debug!(
                    "Session cookie names unknown scenario {}, using initial session",
                    pair.scenario_id
                );
                None
            }
            None => {
                debug!("Malformed session cookie, using initial session");
                None
            }
        });
        Self::new(restored.unwrap_or_else(|| table.initial_session()))
    }

    /// base64url (unpadded) JSON of the pair
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(&*self.state.lock()).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Option<SessionPair> {
        let raw = raw.trim().trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// `Set-Cookie` value carrying the current snapshot
    pub fn set_cookie_header(&self, cookie_name: &str) -> String {
        format!("{}={}; Path=/", cookie_name, self.encode())
    }
}

impl SessionState for CookieSession {
    fn scenario_id(&self) -> String {
        self.state.lock().scenario_id.clone()
    }

    fn set_scenario_id(&self, scenario_id: String) {
        self.state.lock().scenario_id = scenario_id;
    }

    fn context(&self) -> Context {
        self.state.lock().context.clone()
    }

    fn set_context(&self, context: Context) {
        self.state.lock().context = context;
    }
}

/// Value of cookie `name` in a `Cookie` request header
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}
