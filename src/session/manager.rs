//! Registry of live sessions and their lifecycle.

use std::time::Duration;

use crate::catalog::Catalog;
use crate::session::sequencer::{Session, SessionError};
use crate::util::registry::Registry;

/// Owns every in-flight playthrough, keyed by short session id.
///
/// "New game" is a fresh `create`; "resume" is nothing at all — an id that
/// was never removed keeps accepting resolves from wherever it left off.
#[derive(Default)]
pub struct SessionManager {
    sessions: Registry<Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Registry::new(),
        }
    }

    /// Start a playthrough and return its id.
    pub fn create(&self, catalog: &Catalog, pin_window: usize) -> Result<String, SessionError> {
        let session = Session::start(catalog, pin_window, &mut rand::thread_rng())?;
        Ok(self.sessions.insert(session))
    }

    /// Run `f` against a live session. `None` for unknown or discarded ids.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.with(id, f)
    }

    /// Discard a session outright.
    pub fn discard(&self, id: &str) -> bool {
        self.sessions.remove(id)
    }

    pub fn live_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn prune_idle(&self, max_idle: Duration) {
        self.sessions.prune_idle(max_idle);
    }
}
