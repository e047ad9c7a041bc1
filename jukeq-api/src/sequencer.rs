//! Playback sequencing
//!
//! State machine per song: queued --(selected)--> playing --(advance)--> played.
//! `played` is terminal; no transition leaves it. Both transitions are
//! state-guarded store updates, so two songs are never simultaneously playing
//! for one session and a song is never selected twice.

use crate::sse::EventBus;
use crate::{ranking, store};
use jukeq_common::db::models::Song;
use jukeq_common::events::QueueEvent;
use jukeq_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct Sequencer {
    db: SqlitePool,
    events: EventBus,
}

impl Sequencer {
    pub fn new(db: SqlitePool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Return the playing song, selecting the top of the queue when none is
    ///
    /// Idempotent: a second call without an intervening advance returns the
    /// same song without side effects.
    pub async fn current_or_next(&self, session_id: Uuid) -> Result<Option<Song>> {
        if let Some(current) = store::find_playing(&self.db, session_id).await? {
            return Ok(Some(current));
        }

        let selected = self.try_select(session_id).await?;
        if selected.is_some() {
            let playlist = ranking::rank(&self.db, session_id).await?;
            self.events.publish(QueueEvent::PlaylistUpdated { playlist });
        }
        Ok(selected)
    }

    /// Mark a song played and immediately select its successor
    ///
    /// Returns the completed song and the newly playing one (if the queue was
    /// not empty). The updated playlist goes out as one combined broadcast.
    /// Advancing a song that is already played keeps its terminal state and
    /// still runs successor selection, so a double-skip degrades to a no-op.
    pub async fn advance(&self, song_id: Uuid) -> Result<(Song, Option<Song>)> {
        let song = store::get_song(&self.db, song_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("song {}", song_id)))?;

        if store::finish_song(&self.db, song_id).await? {
            info!(song = %song_id, title = %song.title, "song finished");
        }

        let mut completed = song;
        completed.playing = false;
        completed.played = true;

        let next = self.try_select(completed.session_id).await?;

        let playlist = ranking::rank(&self.db, completed.session_id).await?;
        self.events.publish(QueueEvent::PlaylistUpdated { playlist });

        Ok((completed, next))
    }

    /// Pick the top queued song and flip it to playing; no broadcast
    ///
    /// The conditional update can lose to a concurrent selection or to the
    /// candidate leaving the queued state; both cases re-read and retry, so
    /// exactly one song ends up playing.
    async fn try_select(&self, session_id: Uuid) -> Result<Option<Song>> {
        loop {
            let Some(candidate) = store::top_queued(&self.db, session_id).await? else {
                return Ok(None);
            };

            if store::mark_playing_if_none(&self.db, session_id, candidate).await? {
                let song = store::get_song(&self.db, candidate).await?.ok_or_else(|| {
                    Error::Internal(format!("song {} vanished after selection", candidate))
                })?;
                info!(song = %candidate, title = %song.title, "song selected for playback");
                return Ok(Some(song));
            }

            if let Some(current) = store::find_playing(&self.db, session_id).await? {
                // A concurrent selection won; hand back its pick
                return Ok(Some(current));
            }
        }
    }
}
