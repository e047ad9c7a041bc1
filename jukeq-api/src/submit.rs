//! Song submission
//!
//! Admits a new song into the active session: validates the display name and
//! optional message, resolves video metadata through the injected resolver,
//! rejects duplicates, persists, and broadcasts the re-ranked playlist.
//!
//! Metadata resolution happens before anything is written, so a failed or
//! timed-out lookup leaves no partial song record behind.

use crate::sse::EventBus;
use crate::{message, ranking, store};
use crate::resolver::VideoResolver;
use chrono::Utc;
use jukeq_common::db::models::Song;
use jukeq_common::events::QueueEvent;
use jukeq_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct SubmissionEngine {
    db: SqlitePool,
    events: EventBus,
    resolver: Arc<dyn VideoResolver>,
    filter_messages: bool,
}

impl SubmissionEngine {
    pub fn new(
        db: SqlitePool,
        events: EventBus,
        resolver: Arc<dyn VideoResolver>,
        filter_messages: bool,
    ) -> Self {
        Self {
            db,
            events,
            resolver,
            filter_messages,
        }
    }

    /// Submit a song into the active session
    pub async fn submit(
        &self,
        url: &str,
        message_text: Option<&str>,
        participant_name: &str,
    ) -> Result<Song> {
        let name = participant_name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("display name is required".to_string()));
        }

        let message_text = message_text.unwrap_or("").trim().to_string();
        if !message_text.is_empty() && self.filter_messages {
            message::validate(&message_text)?;
        }

        let session = store::find_active_session(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound("no active session".to_string()))?;

        let video = self.resolver.resolve(url).await?;

        // The same track may be queued again only after it has been played
        if store::unplayed_title_exists(&self.db, session.guid, &video.title).await? {
            return Err(Error::Conflict(
                "this song is already in the playlist".to_string(),
            ));
        }

        let participant = store::find_or_create_participant(&self.db, session.guid, name).await?;

        let song = Song {
            guid: Uuid::new_v4(),
            session_id: session.guid,
            title: video.title,
            source_url: url.to_string(),
            video_id: video.video_id,
            message: message_text,
            submitter_id: participant.guid,
            submitter_name: participant.name,
            votes: Vec::new(),
            score: 0,
            playing: false,
            played: false,
            added_at: Utc::now(),
        };
        store::insert_song(&self.db, &song).await?;

        info!(song = %song.guid, title = %song.title, submitter = %song.submitter_name, "song submitted");

        let playlist = ranking::rank(&self.db, session.guid).await?;
        self.events.publish(QueueEvent::PlaylistUpdated { playlist });

        Ok(song)
    }
}
