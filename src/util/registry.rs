//! Keyed registry of live, single-owner game states.
//!
//! Each entry is guarded by its own mutex; the dashmap only serializes
//! insert/remove/prune. Sessions are single-player, so the per-entry lock is
//! uncontended in practice.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::util::id::new_session_id;

struct Slot<S> {
    state: Mutex<S>,
    last_seen: Mutex<Instant>,
}

pub struct Registry<S> {
    slots: DashMap<String, Slot<S>>,
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Store `state` under a fresh short id and return the id.
    pub fn insert(&self, state: S) -> String {
        let id = new_session_id();
        self.slots.insert(
            id.clone(),
            Slot {
                state: Mutex::new(state),
                last_seen: Mutex::new(Instant::now()),
            },
        );
        id
    }

    /// Run `f` against the state under `id`, refreshing its idle clock.
    /// Returns `None` for an unknown id.
    pub fn with<R>(&self, id: &str, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let slot = self.slots.get(id)?;
        *slot.last_seen.lock() = Instant::now();
        let mut state = slot.state.lock();
        Some(f(&mut state))
    }

    /// Discard the state under `id`. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.slots.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop entries idle for longer than `max_idle`.
    pub fn prune_idle(&self, max_idle: Duration) {
        let now = Instant::now();
        self.slots
            .retain(|_, slot| now.duration_since(*slot.last_seen.lock()) < max_idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_with_remove_roundtrip() {
        let registry: Registry<u32> = Registry::new();
        let id = registry.insert(1);
        assert_eq!(registry.with(&id, |n| *n += 1), Some(()));
        assert_eq!(registry.with(&id, |n| *n), Some(2));
        assert_eq!(registry.with("nope", |n| *n), None);
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn prune_drops_idle_entries() {
        let registry: Registry<u32> = Registry::new();
        registry.insert(1);
        registry.prune_idle(Duration::from_secs(60));
        assert_eq!(registry.len(), 1);
        registry.prune_idle(Duration::ZERO);
        assert!(registry.is_empty());
    }
}
