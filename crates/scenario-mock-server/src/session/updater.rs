//! The `updateContext` capability handed to resolvers.

use super::{SessionPair, SessionState, SharedSession};
use crate::context::{Context, PartialContext};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Writes context updates through the session that served the request.
///
/// Cheap to clone; clones may outlive the request (for example inside a
/// background task) and keep writing to the same session.
#[derive(Clone)]
pub struct ContextUpdater {
    session: Arc<dyn SessionState>,
}

impl ContextUpdater {
    pub fn new(session: Arc<dyn SessionState>) -> Self {
        Self { session }
    }

    /// An updater over a private session that no server reads
    pub fn detached(context: Context) -> Self {
        Self::new(Arc::new(SharedSession::new(SessionPair::new(String::new(), context))))
    }

    /// Merge `partial` over the current context and return the new context
    pub fn update(&self, partial: impl Into<PartialContext>) -> Context {
        self.session.update_context(&partial.into())
    }

    /// Compute the update from the current context.
    ///
    /// `f` runs while the session is locked. It must work from the context
    /// it is given and must not call back into this session (`current`,
    /// `update` or `update_with` on any clone of this updater), or it
    /// deadlocks.
    pub fn update_with<F>(&self, f: F) -> Context
    where
        F: Fn(&Context) -> Context + Send + Sync + 'static,
    {
        self.update(PartialContext::from_fn(f))
    }

    pub fn current(&self) -> Context {
        self.session.context()
    }

    /// Apply `f` through `update` every `period`, starting one period from
    /// now, until the returned handle is stopped. `f` runs under the same
    /// no-reentry rule as [`ContextUpdater::update_with`].
    ///
    /// Dropping the handle leaves the task running.
    pub fn every<F>(&self, period: Duration, f: F) -> BackgroundTask
    where
        F: Fn(&Context) -> Context + Send + Sync + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let partial = PartialContext::from_fn(f);
        let updater = self.clone();
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => {
                        debug!("Background context task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        updater.update(partial.clone());
                    }
                }
            }
        });

        BackgroundTask { token, handle }
    }
}

impl fmt::Debug for ContextUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextUpdater")
            .field("scenario_id", &self.session.scenario_id())
            .finish_non_exhaustive()
    }
}

/// Owner handle of a repeating context update
#[derive(Debug)]
pub struct BackgroundTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled() || self.handle.is_finished()
    }

    /// Stop the task and wait for it to wind down
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}
