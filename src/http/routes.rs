//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::middleware::rate_limit;
use crate::store::{
    sessions::{
        PlayerStateAck, PlayerStateUpdate, Session, SessionEnded, SessionStarted, SessionTicket,
    },
    PlayerSummary, Position, StoreError,
};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::solo::solo_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let cors = if state.config.allows_any_origin() {
        cors.allow_origin(Any)
    } else {
        // Multiple origins may be configured (comma-separated in CLIENT_ORIGIN)
        let allowed_origins: Vec<HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        cors.allow_origin(allowed_origins)
    };

    let api_routes = Router::new()
        .route("/api/sessions", post(create_session_handler))
        .route("/api/sessions/:id", get(get_session_handler))
        .route("/api/sessions/:id/join", post(join_session_handler))
        .route("/api/sessions/:id/start", post(start_game_handler))
        .route("/api/sessions/:id/update", post(update_player_handler))
        .route("/api/sessions/:id/end", post(end_game_handler))
        .route("/api/players/:id", get(player_stats_handler))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let realtime_routes = Router::new()
        .route("/ws", get(ws_handler))
        .route("/solo", get(solo_handler));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api_routes)
        .merge(realtime_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_matches: usize,
    relay_connections: usize,
    sessions: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_matches: state.match_registry.active_matches(),
        relay_connections: state.relay.connection_count(),
        sessions: state.sessions.len(),
    })
}

// ============================================================================
// Session endpoints
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerNameRequest {
    #[serde(default)]
    player_name: String,
}

async fn create_session_handler(
    State(state): State<AppState>,
    Json(req): Json<PlayerNameRequest>,
) -> Result<(StatusCode, Json<SessionTicket>), AppError> {
    let ticket = state.sessions.create_session(&req.player_name)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn join_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<PlayerNameRequest>,
) -> Result<Json<SessionTicket>, AppError> {
    Ok(Json(state.sessions.join_session(session_id, &req.player_name)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartGameRequest {
    player_id: Uuid,
}

async fn start_game_handler(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<StartGameRequest>,
) -> Result<Json<SessionStarted>, AppError> {
    Ok(Json(state.sessions.start_game(session_id, req.player_id)?))
}

async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(state.sessions.get_session(session_id)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePlayerRequest {
    player_id: Uuid,
    position: Option<Position>,
    health: Option<f32>,
    weapon: Option<String>,
    action: Option<String>,
}

async fn update_player_handler(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdatePlayerRequest>,
) -> Result<Json<PlayerStateAck>, AppError> {
    let update = PlayerStateUpdate {
        position: req.position,
        health: req.health,
        weapon: req.weapon,
        action: req.action,
    };
    Ok(Json(state.sessions.update_player_state(
        session_id,
        req.player_id,
        update,
    )?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndGameRequest {
    winner_id: Option<Uuid>,
    game_stats: Option<serde_json::Value>,
}

async fn end_game_handler(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<EndGameRequest>,
) -> Result<Json<SessionEnded>, AppError> {
    Ok(Json(state.sessions.end_game(
        session_id,
        req.winner_id,
        req.game_stats,
    )?))
}

// ============================================================================
// Player endpoints
// ============================================================================

async fn player_stats_handler(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(state.sessions.players().get_stats(player_id)?))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::SessionNotFound
            | StoreError::PlayerNotInSession
            | StoreError::WinnerNotInSession
            | StoreError::PlayerNotFound => AppError::NotFound(message),
            StoreError::NotHost => AppError::Forbidden(message),
            StoreError::AlreadyCompleted => AppError::Conflict(message),
            StoreError::InvalidInput(_)
            | StoreError::SessionFull
            | StoreError::AlreadyInProgress
            | StoreError::NotEnoughPlayers => AppError::BadRequest(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
