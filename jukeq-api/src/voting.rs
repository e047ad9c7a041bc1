//! Voting engine
//!
//! Applies a voter's up/down choice to a song with toggle/flip semantics and
//! keeps the song's score equal to #up - #down. At most one vote per
//! (participant, song) pair exists at any time; that bound is structural in
//! the votes table, not enforced by scanning here.

use crate::sse::EventBus;
use crate::{ranking, store};
use jukeq_common::db::models::{Song, VoteDirection};
use jukeq_common::events::QueueEvent;
use jukeq_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct VotingEngine {
    db: SqlitePool,
    events: EventBus,
}

impl VotingEngine {
    pub fn new(db: SqlitePool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Cast, flip, or retract a vote
    ///
    /// - same direction as the participant's standing vote: the vote is
    ///   removed (toggle-off)
    /// - opposite direction: the vote flips
    /// - no standing vote: a new one is appended
    ///
    /// The currently playing song is not votable, so its rank can never move
    /// mid-playback. Returns the updated song and broadcasts the re-ranked
    /// playlist.
    pub async fn cast_vote(
        &self,
        song_id: Uuid,
        participant_name: &str,
        direction: VoteDirection,
    ) -> Result<Song> {
        let name = participant_name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("display name is required".to_string()));
        }

        let song = store::get_song(&self.db, song_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("song {}", song_id)))?;

        let session = store::get_session(&self.db, song.session_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", song.session_id)))?;
        if !session.active {
            return Err(Error::SessionClosed(
                "voting is closed for this session".to_string(),
            ));
        }

        if song.playing {
            return Err(Error::InvalidState(
                "the currently playing song cannot be voted on".to_string(),
            ));
        }
        if song.played {
            return Err(Error::InvalidState(
                "this song has already been played".to_string(),
            ));
        }

        let participant = store::find_or_create_participant(&self.db, song.session_id, name).await?;
        store::toggle_vote(&self.db, song_id, participant.guid, direction).await?;

        let updated = store::get_song(&self.db, song_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("song {} vanished after vote", song_id)))?;
        debug!(song = %song_id, voter = name, score = updated.score, "vote applied");

        let playlist = ranking::rank(&self.db, song.session_id).await?;
        self.events.publish(QueueEvent::PlaylistUpdated { playlist });

        Ok(updated)
    }
}
