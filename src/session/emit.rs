//! Fire-and-forget tally emission.
//!
//! Resolving a card emits a tally event as best-effort telemetry: the
//! gameplay path never waits on it, never retries it, and never observes
//! its outcome. A card whose write was dropped is indistinguishable from a
//! card nobody has rated yet, and that is fine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::tally::{CounterStore, TallyEvent};

/// Cheap handle that queues events for the background apply task.
#[derive(Clone)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<TallyEvent>,
}

impl Emitter {
    /// Spawn the drain task and hand back the sending side.
    ///
    /// Each event gets `apply_timeout` to land in the store; a slow or
    /// failing apply is logged at debug and dropped.
    pub fn spawn(store: Arc<dyn CounterStore>, apply_timeout: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<TallyEvent>();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                // The store call is synchronous; it runs on the blocking
                // pool so the drain task keeps its timeout budget.
                let card_id = event.card_id.clone();
                let store = store.clone();
                let apply = tokio::task::spawn_blocking(move || {
                    store.record(&event.card_id, event.decision)
                });
                match tokio::time::timeout(apply_timeout, apply).await {
                    Ok(Ok(Ok(_))) => {}
                    Ok(Ok(Err(err))) => {
                        tracing::debug!(%card_id, %err, "tally emission dropped");
                    }
                    Ok(Err(join_err)) => {
                        tracing::debug!(%card_id, %join_err, "tally apply task failed");
                    }
                    Err(_) => {
                        tracing::debug!(%card_id, "tally emission timed out");
                    }
                }
            }
        });
        Self { tx }
    }

    /// Queue an event. A closed channel means the process is shutting down;
    /// the event is discarded, as the contract allows.
    pub fn emit(&self, event: TallyEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::{Decision, MemoryStore, StoreError, TallyRecord};

    #[tokio::test]
    async fn emitted_events_reach_the_store() {
        let store = Arc::new(MemoryStore::new());
        let emitter = Emitter::spawn(store.clone(), Duration::from_secs(3));

        emitter.emit(TallyEvent::now("hog-rider", Decision::Accept));
        emitter.emit(TallyEvent::now("hog-rider", Decision::Reject));

        // The apply task is asynchronous; poll briefly rather than sleeping
        // a fixed amount.
        for _ in 0..50 {
            if let Some(record) = store.get("hog-rider").unwrap() {
                if record.total_count == 2 {
                    assert_eq!(record.accept_count, 1);
                    assert_eq!(record.reject_count, 1);
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("events never landed");
    }

    /// Delegates to a [`MemoryStore`], stalling on one designated card id.
    struct StallingStore {
        inner: MemoryStore,
        stall_on: &'static str,
        stall_for: Duration,
    }

    impl CounterStore for StallingStore {
        fn record(&self, card_id: &str, decision: Decision) -> Result<TallyRecord, StoreError> {
            if card_id == self.stall_on {
                std::thread::sleep(self.stall_for);
            }
            self.inner.record(card_id, decision)
        }

        fn get(&self, card_id: &str) -> Result<Option<TallyRecord>, StoreError> {
            self.inner.get(card_id)
        }

        fn top_by_total(&self, limit: usize) -> Result<Vec<TallyRecord>, StoreError> {
            self.inner.top_by_total(limit)
        }

        fn top_by_rate(&self, limit: usize) -> Result<Vec<TallyRecord>, StoreError> {
            self.inner.top_by_rate(limit)
        }
    }

    #[tokio::test]
    async fn slow_apply_times_out_without_stalling_the_queue() {
        let store = Arc::new(StallingStore {
            inner: MemoryStore::new(),
            stall_on: "golem",
            stall_for: Duration::from_secs(2),
        });
        let emitter = Emitter::spawn(store.clone(), Duration::from_millis(50));

        emitter.emit(TallyEvent::now("golem", Decision::Accept));
        emitter.emit(TallyEvent::now("hog-rider", Decision::Accept));

        // The stalled apply must be abandoned after its budget; the next
        // event lands well before the stall would have cleared.
        for _ in 0..100 {
            if store.get("hog-rider").unwrap().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("a stalled apply wedged the drain task");
    }
}
