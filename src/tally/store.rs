//! Counter storage with atomic increment-or-create per card id.

use dashmap::DashMap;
use time::OffsetDateTime;

use super::Decision;

/// Listings with fewer interactions than this are excluded from the
/// rate-ordered leaderboard; a 100% rate off two votes is noise.
pub const MIN_RATED_INTERACTIONS: u64 = 5;

/// Persisted per-card counters. `total_count` is a cached sum and is
/// recomputed on every write.
#[derive(Debug, Clone)]
pub struct TallyRecord {
    pub card_id: String,
    pub accept_count: u64,
    pub reject_count: u64,
    pub total_count: u64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TallyRecord {
    fn new(card_id: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            card_id: card_id.to_string(),
            accept_count: 0,
            reject_count: 0,
            total_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, decision: Decision) {
        match decision {
            Decision::Accept => self.accept_count += 1,
            Decision::Reject => self.reject_count += 1,
        }
        self.total_count = self.accept_count + self.reject_count;
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Percentage of accepts, rounded to the nearest integer. 0 when empty.
    pub fn accept_rate(&self) -> u8 {
        if self.total_count == 0 {
            return 0;
        }
        ((self.accept_count as f64 / self.total_count as f64) * 100.0).round() as u8
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

/// Any datastore offering atomic increment-or-create semantics per key.
///
/// The increment must happen in a single update expression; a caller-side
/// read-modify-write would lose updates under concurrent requests.
pub trait CounterStore: Send + Sync + 'static {
    /// Increment one counter for `card_id`, creating the record if absent.
    /// Returns the record as of this write.
    fn record(&self, card_id: &str, decision: Decision) -> Result<TallyRecord, StoreError>;

    fn get(&self, card_id: &str) -> Result<Option<TallyRecord>, StoreError>;

    /// Up to `limit` records ordered by total interactions, descending.
    fn top_by_total(&self, limit: usize) -> Result<Vec<TallyRecord>, StoreError>;

    /// Up to `limit` records ordered by accept rate, descending, skipping
    /// cards below [`MIN_RATED_INTERACTIONS`].
    fn top_by_rate(&self, limit: usize) -> Result<Vec<TallyRecord>, StoreError>;
}

/// In-process store. The dashmap entry API holds the shard lock across the
/// whole upsert, which makes each increment atomic per key.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, TallyRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Vec<TallyRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }
}

impl CounterStore for MemoryStore {
    fn record(&self, card_id: &str, decision: Decision) -> Result<TallyRecord, StoreError> {
        let mut entry = self
            .records
            .entry(card_id.to_string())
            .or_insert_with(|| TallyRecord::new(card_id));
        entry.apply(decision);
        Ok(entry.clone())
    }

    fn get(&self, card_id: &str) -> Result<Option<TallyRecord>, StoreError> {
        Ok(self.records.get(card_id).map(|r| r.clone()))
    }

    fn top_by_total(&self, limit: usize) -> Result<Vec<TallyRecord>, StoreError> {
        let mut all = self.snapshot();
        all.sort_by(|a, b| b.total_count.cmp(&a.total_count));
        all.truncate(limit);
        Ok(all)
    }

    fn top_by_rate(&self, limit: usize) -> Result<Vec<TallyRecord>, StoreError> {
        let mut rated: Vec<TallyRecord> = self
            .snapshot()
            .into_iter()
            .filter(|r| r.total_count >= MIN_RATED_INTERACTIONS)
            .collect();
        rated.sort_by(|a, b| {
            b.accept_rate()
                .cmp(&a.accept_rate())
                .then(b.total_count.cmp(&a.total_count))
        });
        rated.truncate(limit);
        Ok(rated)
    }
}
