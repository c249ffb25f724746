//! Interaction tallies: per-card accept/reject counters and derived rates.

pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use store::{CounterStore, MemoryStore, StoreError, TallyRecord};

/// The binary judgment a player passes on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Decision::Accept),
            "reject" => Ok(Decision::Reject),
            _ => Err(()),
        }
    }
}

/// One recorded interaction, as emitted by the sequencer or posted over HTTP.
#[derive(Debug, Clone)]
pub struct TallyEvent {
    pub card_id: String,
    pub decision: Decision,
    pub timestamp: OffsetDateTime,
}

impl TallyEvent {
    pub fn now(card_id: impl Into<String>, decision: Decision) -> Self {
        Self {
            card_id: card_id.into(),
            decision,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Wire view of one card's counters plus the derived accept rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub card_id: String,
    pub accept_count: u64,
    pub reject_count: u64,
    pub total_count: u64,
    /// `round(100 * accept / total)`, 0 for an unseen card.
    pub accept_rate: u8,
}

impl CardStats {
    pub fn from_record(record: &TallyRecord) -> Self {
        Self {
            card_id: record.card_id.clone(),
            accept_count: record.accept_count,
            reject_count: record.reject_count,
            total_count: record.total_count,
            accept_rate: record.accept_rate(),
        }
    }

    /// An unseen card has all-zero stats; this is not an error.
    pub fn zeroed(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            accept_count: 0,
            reject_count: 0,
            total_count: 0,
            accept_rate: 0,
        }
    }
}
