//! HTTP surface: router assembly and shared handler state.

pub mod routes;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::session::{Emitter, SessionManager};
use crate::tally::CounterStore;
use crate::trivia::TriviaSession;
use crate::util::registry::Registry;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn CounterStore>,
    pub sessions: Arc<SessionManager>,
    pub trivia: Arc<Registry<TriviaSession>>,
    pub emitter: Emitter,
    pub game: GameConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/cards", get(routes::list_cards))
        .route(
            "/interactions",
            post(routes::track_interaction).get(routes::interaction_stats),
        )
        .route("/interactions/top", get(routes::top_rated))
        .route("/sessions", post(routes::create_session))
        .route(
            "/sessions/:id",
            get(routes::session_state).delete(routes::discard_session),
        )
        .route("/sessions/:id/resolve", post(routes::resolve_card))
        .route("/sessions/:id/cancel", post(routes::cancel_pending))
        .route("/sessions/:id/summary", get(routes::session_summary))
        .route("/sessions/:id/deck", get(routes::sample_deck))
        .route("/trivia", post(routes::create_trivia))
        .route("/trivia/:id", get(routes::trivia_state))
        .route("/trivia/:id/reveal", post(routes::trivia_reveal))
        .route("/trivia/:id/guess", post(routes::trivia_guess))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
