//! Request handlers: tally endpoints, session lifecycle, trivia rounds.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::catalog::Card;
use crate::session::sequencer::{Proposal, SessionError};
use crate::session::DECK_SIZE;
use crate::tally::{CardStats, Decision, TallyEvent};
use crate::trivia::TriviaError;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

// The body stays opaque; the detail goes to the log.
fn store_error(err: crate::tally::StoreError) -> ApiError {
    tracing::error!(%err, "datastore failure");
    error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record interaction")
}

fn session_not_found() -> ApiError {
    error(StatusCode::NOT_FOUND, "session not found")
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn list_cards(State(state): State<AppState>) -> Json<Vec<Card>> {
    Json(state.catalog.cards().to_vec())
}

// ---------- interaction tallies ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(default)]
    card_id: Option<String>,
    #[serde(default)]
    decision: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    success: bool,
    card_id: String,
    decision: Decision,
}

pub async fn track_interaction(
    State(state): State<AppState>,
    Json(req): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, ApiError> {
    let missing = || {
        error(
            StatusCode::BAD_REQUEST,
            "Missing required fields: cardId and decision",
        )
    };
    let card_id = req
        .card_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(missing)?;
    let decision: Decision = req
        .decision
        .as_deref()
        .ok_or_else(missing)?
        .parse()
        .map_err(|_| {
            error(
                StatusCode::BAD_REQUEST,
                "Invalid decision. Must be \"accept\" or \"reject\"",
            )
        })?;
    if let Some(ts) = &req.timestamp {
        tracing::debug!(%card_id, %ts, "client-supplied timestamp");
    }

    let record = state.store.record(card_id, decision).map_err(store_error)?;
    tracing::debug!(card_id = %record.card_id, total = record.total_count, "interaction recorded");
    Ok(Json(TrackResponse {
        success: true,
        card_id: record.card_id,
        decision,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    card_id: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsListResponse {
    stats: Vec<CardStats>,
    total_cards: usize,
}

/// `?cardId=` serves one card (zeroed when unseen, never an error);
/// otherwise up to `?limit=` records ordered by total interactions.
pub async fn interaction_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Response, ApiError> {
    if let Some(card_id) = query.card_id {
        let stats = state
            .store
            .get(&card_id)
            .map_err(store_error)?
            .map(|r| CardStats::from_record(&r))
            .unwrap_or_else(|| CardStats::zeroed(&card_id));
        return Ok(Json(stats).into_response());
    }

    let limit = query.limit.unwrap_or(100);
    let stats: Vec<CardStats> = state
        .store
        .top_by_total(limit)
        .map_err(store_error)?
        .iter()
        .map(CardStats::from_record)
        .collect();
    Ok(Json(StatsListResponse {
        total_cards: stats.len(),
        stats,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    limit: Option<usize>,
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<StatsListResponse>, ApiError> {
    let stats: Vec<CardStats> = state
        .store
        .top_by_rate(query.limit.unwrap_or(10))
        .map_err(store_error)?
        .iter()
        .map(CardStats::from_record)
        .collect();
    Ok(Json(StatsListResponse {
        total_cards: stats.len(),
        stats,
    }))
}

// ---------- rating sessions ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateView {
    session_id: String,
    position: usize,
    total: usize,
    complete: bool,
    pending_confirmation: bool,
    current: Option<Card>,
    lookahead: Vec<String>,
}

fn session_view(state: &AppState, id: &str) -> Option<SessionStateView> {
    state.sessions.with_session(id, |session| SessionStateView {
        session_id: id.to_string(),
        position: session.position(),
        total: session.total(),
        complete: session.is_complete(),
        pending_confirmation: session.pending().is_some(),
        current: session.current_card(&state.catalog).cloned(),
        lookahead: session.lookahead(state.game.lookahead).to_vec(),
    })
}

pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionStateView>, ApiError> {
    let id = state
        .sessions
        .create(&state.catalog, state.game.pin_window)
        .map_err(|err| error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    tracing::info!(session_id = %id, cards = state.catalog.len(), "session started");
    session_view(&state, &id)
        .map(Json)
        .ok_or_else(session_not_found)
}

pub async fn session_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStateView>, ApiError> {
    session_view(&state, &id)
        .map(Json)
        .ok_or_else(session_not_found)
}

pub async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.sessions.discard(&id) {
        return Err(session_not_found());
    }
    tracing::info!(session_id = %id, "session discarded");
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    decision: Decision,
    /// Set after the player answered the confirmation prompt.
    #[serde(default)]
    confirmed: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ResolveResponse {
    /// The interruption fired: nothing was recorded, re-post with
    /// `confirmed: true` (or cancel) to move on.
    #[serde(rename_all = "camelCase")]
    Confirm { card_id: String, decision: Decision },
    #[serde(rename_all = "camelCase")]
    Resolved {
        card_id: String,
        decision: Decision,
        complete: bool,
        position: usize,
        total: usize,
        next: Option<Card>,
        lookahead: Vec<String>,
    },
}

pub async fn resolve_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let outcome = state
        .sessions
        .with_session(&id, |session| {
            if req.confirmed {
                if session.pending().is_some() {
                    session.confirm().map(Proposal::Resolved)
                } else {
                    session.resolve(req.decision).map(Proposal::Resolved)
                }
            } else {
                session.propose(req.decision, state.game.confirm_chance, &mut rand::thread_rng())
            }
        })
        .ok_or_else(session_not_found)?;

    match outcome {
        Ok(Proposal::NeedsConfirmation { card_id, decision }) => {
            Ok(Json(ResolveResponse::Confirm { card_id, decision }))
        }
        Ok(Proposal::Resolved(resolved)) => {
            // Best-effort telemetry; the response does not wait on it.
            state
                .emitter
                .emit(TallyEvent::now(resolved.card_id.clone(), resolved.decision));

            let view = session_view(&state, &id).ok_or_else(session_not_found)?;
            Ok(Json(ResolveResponse::Resolved {
                card_id: resolved.card_id,
                decision: resolved.decision,
                complete: resolved.complete,
                position: view.position,
                total: view.total,
                next: view.current,
                lookahead: view.lookahead,
            }))
        }
        Err(SessionError::SessionComplete) => {
            Err(error(StatusCode::CONFLICT, "session already complete"))
        }
        Err(err) => Err(error(StatusCode::CONFLICT, err.to_string())),
    }
}

pub async fn cancel_pending(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStateView>, ApiError> {
    state
        .sessions
        .with_session(&id, |session| session.cancel())
        .ok_or_else(session_not_found)?;
    session_view(&state, &id)
        .map(Json)
        .ok_or_else(session_not_found)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    accepted: Vec<Card>,
    rejected: Vec<Card>,
    total_resolved: usize,
    accept_rate: u8,
}

pub async fn session_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SummaryView>, ApiError> {
    let summary = state
        .sessions
        .with_session(&id, |session| session.summary(&state.catalog))
        .ok_or_else(session_not_found)?;

    let accept_rate = if summary.total_resolved == 0 {
        0
    } else {
        ((summary.accepted.len() as f64 / summary.total_resolved as f64) * 100.0).round() as u8
    };
    Ok(Json(SummaryView {
        accepted: summary.accepted,
        rejected: summary.rejected,
        total_resolved: summary.total_resolved,
        accept_rate,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeckQuery {
    outcome: String,
    size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckResponse {
    outcome: Decision,
    cards: Vec<Card>,
    count: usize,
}

pub async fn sample_deck(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeckQuery>,
) -> Result<Json<DeckResponse>, ApiError> {
    let outcome: Decision = query.outcome.parse().map_err(|_| {
        error(
            StatusCode::BAD_REQUEST,
            "Invalid outcome. Must be \"accept\" or \"reject\"",
        )
    })?;
    let size = query.size.unwrap_or(DECK_SIZE);

    let cards = state
        .sessions
        .with_session(&id, |session| {
            session.sample_deck(&state.catalog, outcome, size, &mut rand::thread_rng())
        })
        .ok_or_else(session_not_found)?;
    Ok(Json(DeckResponse {
        outcome,
        count: cards.len(),
        cards,
    }))
}

// ---------- guess the card ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaStateView {
    session_id: String,
    position: usize,
    total: usize,
    complete: bool,
    reveal_level: u8,
    score: u32,
    streak: u32,
    best_streak: u32,
    accuracy: u8,
    /// Artwork of the card under guess. Id and name stay server-side until
    /// the guess lands.
    image_url: Option<String>,
}

fn trivia_view(state: &AppState, id: &str) -> Option<TriviaStateView> {
    state.trivia.with(id, |session| TriviaStateView {
        session_id: id.to_string(),
        position: session.position(),
        total: session.total(),
        complete: session.is_complete(),
        reveal_level: session.reveal_level(),
        score: session.score(),
        streak: session.streak(),
        best_streak: session.best_streak(),
        accuracy: session.accuracy(),
        image_url: session
            .current_card(&state.catalog)
            .map(|c| c.image_url.clone()),
    })
}

pub async fn create_trivia(
    State(state): State<AppState>,
) -> Result<Json<TriviaStateView>, ApiError> {
    let session = crate::trivia::TriviaSession::start(&state.catalog, &mut rand::thread_rng())
        .map_err(|err| error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    let id = state.trivia.insert(session);
    tracing::info!(session_id = %id, "trivia round started");
    trivia_view(&state, &id)
        .map(Json)
        .ok_or_else(session_not_found)
}

pub async fn trivia_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TriviaStateView>, ApiError> {
    trivia_view(&state, &id)
        .map(Json)
        .ok_or_else(session_not_found)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    reveal_level: u8,
}

pub async fn trivia_reveal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RevealResponse>, ApiError> {
    let level = state
        .trivia
        .with(&id, |session| session.reveal())
        .ok_or_else(session_not_found)?;
    match level {
        Ok(reveal_level) => Ok(Json(RevealResponse { reveal_level })),
        Err(TriviaError::RoundComplete) => {
            Err(error(StatusCode::CONFLICT, "round already complete"))
        }
        Err(err) => Err(error(StatusCode::CONFLICT, err.to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    card_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    correct: bool,
    points: u32,
    answer: Card,
    score: u32,
    streak: u32,
    best_streak: u32,
    accuracy: u8,
    complete: bool,
}

pub async fn trivia_guess(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<GuessRequest>,
) -> Result<Json<GuessResponse>, ApiError> {
    let outcome = state
        .trivia
        .with(&id, |session| {
            let outcome = session.guess(&state.catalog, &req.card_id)?;
            Ok::<_, TriviaError>((
                outcome,
                session.score(),
                session.streak(),
                session.best_streak(),
                session.accuracy(),
            ))
        })
        .ok_or_else(session_not_found)?;

    match outcome {
        Ok((outcome, score, streak, best_streak, accuracy)) => Ok(Json(GuessResponse {
            correct: outcome.correct,
            points: outcome.points,
            answer: outcome.answer,
            score,
            streak,
            best_streak,
            accuracy,
            complete: outcome.complete,
        })),
        Err(TriviaError::RoundComplete) => {
            Err(error(StatusCode::CONFLICT, "round already complete"))
        }
        Err(err) => Err(error(StatusCode::CONFLICT, err.to_string())),
    }
}
