//! One player's traversal of the catalog: shuffle order, decisions, and the
//! fire-and-forget tally emission that rides along with each resolve.

pub mod emit;
pub mod manager;
pub mod sequencer;

pub use emit::Emitter;
pub use manager::SessionManager;
pub use sequencer::{Proposal, Resolved, Session, SessionError, Summary, DECK_SIZE};
