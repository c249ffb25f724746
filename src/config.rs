//! Configuration utilities (ports, paths, game knobs, env vars)

use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 8080, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Path to the card catalog JSON file (`CARDS_PATH`, default `data/cards.json`).
pub fn catalog_path() -> PathBuf {
    env::var("CARDS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/cards.json"))
}

/// How long an untouched session survives before the prune task drops it
/// (`SESSION_TTL_SECS`, default one hour).
pub fn session_ttl() -> Duration {
    let secs = env::var("SESSION_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(3600);
    Duration::from_secs(secs)
}

/// Client-side budget for applying one tally emission before it is dropped
/// (`EMIT_TIMEOUT_MS`, default 3s).
pub fn emit_timeout() -> Duration {
    let ms = env::var("EMIT_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(3000);
    Duration::from_millis(ms)
}

/// Gameplay knobs shared by the sequencer handlers.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Pinned-early cards land at a uniform index within the first
    /// `pin_window` slots of the shuffled order.
    pub pin_window: usize,
    /// Probability that a resolve is interrupted by a confirmation prompt.
    pub confirm_chance: f64,
    /// Upcoming cards materialized for preview.
    pub lookahead: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pin_window: 25,
            confirm_chance: 0.05,
            lookahead: 3,
        }
    }
}

impl GameConfig {
    /// Build from env vars (`PIN_WINDOW`, `CONFIRM_CHANCE`, `LOOKAHEAD`),
    /// falling back to defaults per knob.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pin_window: env::var("PIN_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pin_window),
            confirm_chance: env::var("CONFIRM_CHANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.confirm_chance),
            lookahead: env::var("LOOKAHEAD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lookahead),
        }
    }
}
