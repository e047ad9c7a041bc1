//! Shared test harness: a throwaway database, a stub video resolver, and the
//! wired-up engines.

// Not every test binary uses every helper
#![allow(dead_code)]

use async_trait::async_trait;
use jukeq_api::resolver::{extract_video_id, VideoInfo, VideoResolver};
use jukeq_api::sequencer::Sequencer;
use jukeq_api::session::SessionManager;
use jukeq_api::sse::EventBus;
use jukeq_api::submit::SubmissionEngine;
use jukeq_api::voting::VotingEngine;
use jukeq_common::config::AdmissionWindow;
use jukeq_common::db::init_database;
use jukeq_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

/// Resolver that derives a deterministic title from the video id, so tests
/// never touch the network
pub struct StubResolver;

#[async_trait]
impl VideoResolver for StubResolver {
    async fn resolve(&self, url: &str) -> Result<VideoInfo> {
        let video_id = extract_video_id(url).ok_or_else(|| {
            Error::InvalidInput("not a recognizable YouTube video URL".to_string())
        })?;
        Ok(VideoInfo {
            title: format!("Title of {}", video_id),
            video_id,
        })
    }
}

/// Resolver that always fails upstream, for no-partial-state tests
pub struct FailingResolver;

#[async_trait]
impl VideoResolver for FailingResolver {
    async fn resolve(&self, _url: &str) -> Result<VideoInfo> {
        Err(Error::Upstream("video lookup timed out".to_string()))
    }
}

pub struct TestApp {
    // Held so the database file outlives the test
    pub _dir: TempDir,
    pub db: SqlitePool,
    pub events: EventBus,
    pub sessions: SessionManager,
    pub voting: VotingEngine,
    pub sequencer: Sequencer,
    pub submissions: SubmissionEngine,
}

/// Build a fully wired app with an always-open admission window
pub async fn setup() -> TestApp {
    setup_with_window(AdmissionWindow::default()).await
}

pub async fn setup_with_window(window: AdmissionWindow) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = init_database(&dir.path().join("jukeq.db"))
        .await
        .expect("database init");
    let events = EventBus::new(64);

    TestApp {
        sessions: SessionManager::new(db.clone(), events.clone(), window),
        voting: VotingEngine::new(db.clone(), events.clone()),
        sequencer: Sequencer::new(db.clone(), events.clone()),
        submissions: SubmissionEngine::new(db.clone(), events.clone(), Arc::new(StubResolver), true),
        _dir: dir,
        db,
        events,
    }
}

/// A syntactically valid YouTube URL whose 11-character id is `id`
pub fn yt(id: &str) -> String {
    assert_eq!(id.len(), 11, "video ids are 11 characters");
    format!("https://youtu.be/{}", id)
}

pub const VIDEO_A: &str = "AAAAAAAAAAA";
pub const VIDEO_B: &str = "BBBBBBBBBBB";
pub const VIDEO_C: &str = "CCCCCCCCCCC";
