//! HTTP server setup and routing

use crate::resolver::VideoResolver;
use crate::sequencer::Sequencer;
use crate::session::SessionManager;
use crate::sse::EventBus;
use crate::submit::SubmissionEngine;
use crate::voting::VotingEngine;
use axum::{
    routing::{get, post},
    Router,
};
use jukeq_common::config::Config;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application context passed to all handlers
///
/// The engines hold only pool and event-bus handles, so cloning the context
/// per request is cheap.
#[derive(Clone)]
pub struct AppContext {
    pub db: SqlitePool,
    pub events: EventBus,
    pub sessions: SessionManager,
    pub voting: VotingEngine,
    pub sequencer: Sequencer,
    pub submissions: SubmissionEngine,
    /// Bearer token required on admin endpoints; None disables the check
    pub admin_token: Option<String>,
}

impl AppContext {
    pub fn new(
        db: SqlitePool,
        events: EventBus,
        config: &Config,
        resolver: Arc<dyn VideoResolver>,
    ) -> Self {
        let sessions = SessionManager::new(db.clone(), events.clone(), config.admission);
        let voting = VotingEngine::new(db.clone(), events.clone());
        let sequencer = Sequencer::new(db.clone(), events.clone());
        let submissions = SubmissionEngine::new(
            db.clone(),
            events.clone(),
            resolver,
            config.moderation.filter_messages,
        );

        Self {
            db,
            events,
            sessions,
            voting,
            sequencer,
            submissions,
            admin_token: config.server.admin_token.clone(),
        }
    }
}

/// Build the application router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Session lifecycle
        .route("/api/session", get(super::handlers::get_session))
        .route("/api/session/start", post(super::handlers::start_session))
        .route("/api/session/end", post(super::handlers::end_session))
        // Playlist and songs
        .route("/api/playlist", get(super::handlers::get_playlist))
        .route("/api/songs", post(super::handlers::submit_song))
        .route("/api/songs/:song_id/vote", post(super::handlers::vote_song))
        .route("/api/songs/:song_id/played", post(super::handlers::mark_played))
        // Playback
        .route("/api/playback/current", get(super::handlers::current_song))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
