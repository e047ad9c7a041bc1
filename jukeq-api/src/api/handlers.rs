//! HTTP request handlers
//!
//! Thin adapters between the HTTP surface and the core engines. Status-code
//! mapping for the error taxonomy lives here; the core never sees HTTP.

use crate::api::server::AppContext;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jukeq_common::db::models::{Session, Song, VoteDirection};
use jukeq_common::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

// ============================================================================
// Error mapping
// ============================================================================

/// API-layer error wrapper: core errors plus the HTTP-only unauthorized case
pub enum ApiError {
    Core(Error),
    Unauthorized,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "admin token required".to_string(),
            ),
            ApiError::Core(e) => {
                let status = match &e {
                    Error::AdmissionWindow(_) => StatusCode::FORBIDDEN,
                    Error::Conflict(_) => StatusCode::CONFLICT,
                    Error::NotFound(_) => StatusCode::NOT_FOUND,
                    Error::SessionClosed(_) | Error::InvalidState(_) => StatusCode::CONFLICT,
                    Error::InvalidMessage(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    Error::Upstream(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("internal error: {}", e);
                }
                (status, e.kind(), e.to_string())
            }
        };

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

/// Check the bearer token on admin endpoints
///
/// An unset token disables the check (development convenience, same
/// convention as a zero shared secret). Token verification itself is assumed
/// to happen upstream; this is only the equality gate.
fn require_admin(ctx: &AppContext, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = ctx.admin_token.as_deref() else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Option<Session>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StartSessionRequest {
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitSongRequest {
    pub url: String,
    pub message: Option<String>,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub song: Song,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub username: String,
    pub direction: VoteDirection,
}

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub playlist: Vec<Song>,
}

#[derive(Debug, Serialize)]
pub struct CurrentSongResponse {
    pub current: Option<Song>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub completed: Song,
    pub next: Option<Song>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "jukeq-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/session - current active session, or null
pub async fn get_session(State(ctx): State<AppContext>) -> ApiResult<Json<SessionResponse>> {
    let session = ctx.sessions.active_session().await?;
    Ok(Json(SessionResponse { session }))
}

/// POST /api/session/start - admin: open a new session
pub async fn start_session(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Option<Json<StartSessionRequest>>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    require_admin(&ctx, &headers)?;

    let actor = body
        .and_then(|Json(req)| req.actor)
        .unwrap_or_else(|| "admin".to_string());
    let session = ctx.sessions.start_session(&actor).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session: Some(session),
        }),
    ))
}

/// POST /api/session/end - admin: close the active session
pub async fn end_session(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    require_admin(&ctx, &headers)?;

    let session = ctx.sessions.end_session().await?;
    Ok(Json(SessionResponse {
        session: Some(session),
    }))
}

/// GET /api/playlist - ranked playlist of the active session
pub async fn get_playlist(State(ctx): State<AppContext>) -> ApiResult<Json<PlaylistResponse>> {
    let session = ctx
        .sessions
        .active_session()
        .await?
        .ok_or_else(|| Error::NotFound("no active session".to_string()))?;

    let playlist = crate::ranking::rank(&ctx.db, session.guid).await?;
    Ok(Json(PlaylistResponse { playlist }))
}

/// POST /api/songs - submit a song into the active session
pub async fn submit_song(
    State(ctx): State<AppContext>,
    Json(req): Json<SubmitSongRequest>,
) -> ApiResult<(StatusCode, Json<SongResponse>)> {
    let song = ctx
        .submissions
        .submit(&req.url, req.message.as_deref(), &req.username)
        .await?;

    Ok((StatusCode::CREATED, Json(SongResponse { song })))
}

/// POST /api/songs/:song_id/vote - cast, flip, or retract a vote
pub async fn vote_song(
    State(ctx): State<AppContext>,
    Path(song_id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<SongResponse>> {
    let song = ctx
        .voting
        .cast_vote(song_id, &req.username, req.direction)
        .await?;

    Ok(Json(SongResponse { song }))
}

/// GET /api/playback/current - the playing song, selecting one if needed
pub async fn current_song(State(ctx): State<AppContext>) -> ApiResult<Json<CurrentSongResponse>> {
    let session = ctx
        .sessions
        .active_session()
        .await?
        .ok_or_else(|| Error::NotFound("no active session".to_string()))?;

    let current = ctx.sequencer.current_or_next(session.guid).await?;
    Ok(Json(CurrentSongResponse { current }))
}

/// POST /api/songs/:song_id/played - admin: finish a song and advance
pub async fn mark_played(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(song_id): Path<Uuid>,
) -> ApiResult<Json<AdvanceResponse>> {
    require_admin(&ctx, &headers)?;

    let (completed, next) = ctx.sequencer.advance(song_id).await?;
    Ok(Json(AdvanceResponse { completed, next }))
}
