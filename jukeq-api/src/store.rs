//! Entity store queries
//!
//! Every read and write of sessions, participants, songs, and votes lives
//! here; no other module issues SQL. All invariant-bearing transitions are
//! single state-guarded statements checked via `rows_affected`, so two
//! interleaved callers can never both observe success:
//! - one active session: `INSERT ... WHERE NOT EXISTS (active session)`
//! - one playing song:   `UPDATE ... WHERE NOT EXISTS (playing song)`
//! - terminal played:    `UPDATE ... WHERE played = 0`
//!
//! Vote toggling is a chain of conditional single statements followed by a
//! score recompute derived in SQL from the votes table, so the stored score
//! always equals #up - #down no matter how votes interleave.

use chrono::{DateTime, Utc};
use jukeq_common::db::models::{Participant, Session, Song, Vote, VoteDirection};
use jukeq_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

fn parse_guid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("malformed guid in database: {}", e)))
}

// ============================================================================
// Sessions
// ============================================================================

fn row_to_session(row: &SqliteRow) -> Result<Session> {
    Ok(Session {
        guid: parse_guid(&row.get::<String, _>("guid"))?,
        start_time: row.get::<DateTime<Utc>, _>("start_time"),
        end_time: row.get::<Option<DateTime<Utc>>, _>("end_time"),
        active: row.get::<i64, _>("active") != 0,
        created_by: row.get("created_by"),
    })
}

/// Get the session with active = 1, if any
pub async fn find_active_session(db: &SqlitePool) -> Result<Option<Session>> {
    let row = sqlx::query(
        "SELECT guid, start_time, end_time, active, created_by FROM sessions WHERE active = 1",
    )
    .fetch_optional(db)
    .await?;

    row.as_ref().map(row_to_session).transpose()
}

/// Get a session by id
pub async fn get_session(db: &SqlitePool, guid: Uuid) -> Result<Option<Session>> {
    let row = sqlx::query(
        "SELECT guid, start_time, end_time, active, created_by FROM sessions WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(db)
    .await?;

    row.as_ref().map(row_to_session).transpose()
}

/// Insert a new active session, unless one is already active
///
/// Returns false when the guard failed (another session holds active = 1).
pub async fn create_session_if_none_active(db: &SqlitePool, session: &Session) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO sessions (guid, start_time, end_time, active, created_by)
        SELECT ?, ?, NULL, 1, ?
        WHERE NOT EXISTS (SELECT 1 FROM sessions WHERE active = 1)
        "#,
    )
    .bind(session.guid.to_string())
    .bind(session.start_time)
    .bind(&session.created_by)
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Deactivate a session and stamp its end time
///
/// Returns false when the session was already inactive.
pub async fn close_session(db: &SqlitePool, guid: Uuid, end_time: DateTime<Utc>) -> Result<bool> {
    let result = sqlx::query("UPDATE sessions SET active = 0, end_time = ? WHERE guid = ? AND active = 1")
        .bind(end_time)
        .bind(guid.to_string())
        .execute(db)
        .await?;

    Ok(result.rows_affected() == 1)
}

// ============================================================================
// Participants
// ============================================================================

fn row_to_participant(row: &SqliteRow) -> Result<Participant> {
    Ok(Participant {
        guid: parse_guid(&row.get::<String, _>("guid"))?,
        session_id: parse_guid(&row.get::<String, _>("session_id"))?,
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

/// Resolve a participant by exact display name within a session, creating the
/// record on first sight
///
/// `INSERT OR IGNORE` against the `(session_id, name)` unique index keeps
/// this race-free: two interleaved calls for a new name both end up reading
/// the same row.
pub async fn find_or_create_participant(
    db: &SqlitePool,
    session_id: Uuid,
    name: &str,
) -> Result<Participant> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO participants (guid, session_id, name, color, created_at)
        VALUES (?, ?, ?, NULL, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(session_id.to_string())
    .bind(name)
    .bind(Utc::now())
    .execute(db)
    .await?;

    let row = sqlx::query(
        "SELECT guid, session_id, name, color, created_at FROM participants WHERE session_id = ? AND name = ?",
    )
    .bind(session_id.to_string())
    .bind(name)
    .fetch_one(db)
    .await?;

    row_to_participant(&row)
}

// ============================================================================
// Songs
// ============================================================================

fn row_to_song(row: &SqliteRow) -> Result<Song> {
    Ok(Song {
        guid: parse_guid(&row.get::<String, _>("guid"))?,
        session_id: parse_guid(&row.get::<String, _>("session_id"))?,
        title: row.get("title"),
        source_url: row.get("source_url"),
        video_id: row.get("video_id"),
        message: row.get("message"),
        submitter_id: parse_guid(&row.get::<String, _>("submitter_id"))?,
        submitter_name: row.get("submitter_name"),
        votes: Vec::new(),
        score: row.get::<i64, _>("score"),
        playing: row.get::<i64, _>("playing") != 0,
        played: row.get::<i64, _>("played") != 0,
        added_at: row.get::<DateTime<Utc>, _>("added_at"),
    })
}

const SONG_COLUMNS: &str = r#"
    s.guid, s.session_id, s.title, s.source_url, s.video_id, s.message,
    s.submitter_id, p.name AS submitter_name, s.score, s.playing, s.played,
    s.added_at
"#;

/// Insert a freshly submitted song (queued, score 0, no votes)
pub async fn insert_song(db: &SqlitePool, song: &Song) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO songs
            (guid, session_id, title, source_url, video_id, message,
             submitter_id, score, playing, played, added_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, 0, ?)
        "#,
    )
    .bind(song.guid.to_string())
    .bind(song.session_id.to_string())
    .bind(&song.title)
    .bind(&song.source_url)
    .bind(&song.video_id)
    .bind(&song.message)
    .bind(song.submitter_id.to_string())
    .bind(song.added_at)
    .execute(db)
    .await?;

    Ok(())
}

/// Get a song by id, with its vote list and submitter name
pub async fn get_song(db: &SqlitePool, guid: Uuid) -> Result<Option<Song>> {
    let query = format!(
        "SELECT {SONG_COLUMNS} FROM songs s JOIN participants p ON s.submitter_id = p.guid WHERE s.guid = ?"
    );
    let row = sqlx::query(&query)
        .bind(guid.to_string())
        .fetch_optional(db)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut song = row_to_song(&row)?;
    song.votes = votes_for_song(db, guid).await?;
    Ok(Some(song))
}

/// Standing votes on one song
async fn votes_for_song(db: &SqlitePool, song_id: Uuid) -> Result<Vec<Vote>> {
    let rows = sqlx::query("SELECT participant_id, direction FROM votes WHERE song_id = ?")
        .bind(song_id.to_string())
        .fetch_all(db)
        .await?;

    rows.iter()
        .map(|row| {
            let direction: String = row.get("direction");
            Ok(Vote {
                participant_id: parse_guid(&row.get::<String, _>("participant_id"))?,
                direction: VoteDirection::parse(&direction)
                    .ok_or_else(|| Error::Internal(format!("unknown vote direction: {}", direction)))?,
            })
        })
        .collect()
}

/// All non-played songs of a session, in insertion order, votes attached
///
/// Played songs never leave this filter; the ranker orders what remains.
pub async fn unplayed_songs(db: &SqlitePool, session_id: Uuid) -> Result<Vec<Song>> {
    let query = format!(
        r#"
        SELECT {SONG_COLUMNS} FROM songs s
        JOIN participants p ON s.submitter_id = p.guid
        WHERE s.session_id = ? AND s.played = 0
        ORDER BY s.rowid ASC
        "#
    );
    let rows = sqlx::query(&query)
        .bind(session_id.to_string())
        .fetch_all(db)
        .await?;

    let mut songs = rows
        .iter()
        .map(row_to_song)
        .collect::<Result<Vec<Song>>>()?;

    // One query for all vote lists instead of one per song
    let vote_rows = sqlx::query(
        r#"
        SELECT v.song_id, v.participant_id, v.direction
        FROM votes v
        JOIN songs s ON v.song_id = s.guid
        WHERE s.session_id = ? AND s.played = 0
        "#,
    )
    .bind(session_id.to_string())
    .fetch_all(db)
    .await?;

    let mut by_song: HashMap<Uuid, Vec<Vote>> = HashMap::new();
    for row in &vote_rows {
        let song_id = parse_guid(&row.get::<String, _>("song_id"))?;
        let direction: String = row.get("direction");
        by_song.entry(song_id).or_default().push(Vote {
            participant_id: parse_guid(&row.get::<String, _>("participant_id"))?,
            direction: VoteDirection::parse(&direction)
                .ok_or_else(|| Error::Internal(format!("unknown vote direction: {}", direction)))?,
        });
    }
    for song in &mut songs {
        if let Some(votes) = by_song.remove(&song.guid) {
            song.votes = votes;
        }
    }

    Ok(songs)
}

/// Whether a non-played song with this title already exists in the session
pub async fn unplayed_title_exists(db: &SqlitePool, session_id: Uuid, title: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM songs WHERE session_id = ? AND title = ? AND played = 0")
        .bind(session_id.to_string())
        .bind(title)
        .fetch_optional(db)
        .await?;

    Ok(row.is_some())
}

/// The session's currently playing song, if any
pub async fn find_playing(db: &SqlitePool, session_id: Uuid) -> Result<Option<Song>> {
    let row = sqlx::query("SELECT guid FROM songs WHERE session_id = ? AND playing = 1")
        .bind(session_id.to_string())
        .fetch_optional(db)
        .await?;

    match row {
        Some(row) => get_song(db, parse_guid(&row.get::<String, _>("guid"))?).await,
        None => Ok(None),
    }
}

/// Top of the queued ordering: highest score, earliest submission on ties
pub async fn top_queued(db: &SqlitePool, session_id: Uuid) -> Result<Option<Uuid>> {
    let row = sqlx::query(
        r#"
        SELECT guid FROM songs
        WHERE session_id = ? AND playing = 0 AND played = 0
        ORDER BY score DESC, added_at ASC, rowid ASC
        LIMIT 1
        "#,
    )
    .bind(session_id.to_string())
    .fetch_optional(db)
    .await?;

    row.map(|r| parse_guid(&r.get::<String, _>("guid"))).transpose()
}

/// Mark a queued song as playing, unless the session already has one
///
/// Returns false when the song left the queued state underneath us or a
/// concurrent selection won.
pub async fn mark_playing_if_none(db: &SqlitePool, session_id: Uuid, guid: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE songs SET playing = 1
        WHERE guid = ? AND playing = 0 AND played = 0
          AND NOT EXISTS (SELECT 1 FROM songs WHERE session_id = ? AND playing = 1)
        "#,
    )
    .bind(guid.to_string())
    .bind(session_id.to_string())
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Move a song to its terminal state: played = 1, playing = 0
///
/// Returns false when the song was already played (the guard makes a
/// double-advance a no-op rather than a second transition).
pub async fn finish_song(db: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE songs SET played = 1, playing = 0 WHERE guid = ? AND played = 0")
        .bind(guid.to_string())
        .execute(db)
        .await?;

    Ok(result.rows_affected() == 1)
}

// ============================================================================
// Votes
// ============================================================================

/// Apply a participant's up/down choice with toggle semantics and recompute
/// the song's score
///
/// - same direction as the standing vote: remove it (toggle-off)
/// - opposite direction: overwrite
/// - no standing vote: append
///
/// Each step is one conditional statement rather than a read-then-write, so
/// interleaved calls never lose an update: the delete only fires on a
/// same-direction vote, the flip only on an opposite one, and the insert
/// yields to a concurrent insert of the same key. The score recompute always
/// derives from the votes table, so whichever recompute runs last leaves
/// score == #up - #down.
pub async fn toggle_vote(
    db: &SqlitePool,
    song_id: Uuid,
    participant_id: Uuid,
    direction: VoteDirection,
) -> Result<()> {
    let removed = sqlx::query(
        "DELETE FROM votes WHERE song_id = ? AND participant_id = ? AND direction = ?",
    )
    .bind(song_id.to_string())
    .bind(participant_id.to_string())
    .bind(direction.as_str())
    .execute(db)
    .await?
    .rows_affected();

    if removed == 0 {
        let flipped = sqlx::query(
            "UPDATE votes SET direction = ? WHERE song_id = ? AND participant_id = ? AND direction <> ?",
        )
        .bind(direction.as_str())
        .bind(song_id.to_string())
        .bind(participant_id.to_string())
        .bind(direction.as_str())
        .execute(db)
        .await?
        .rows_affected();

        if flipped == 0 {
            sqlx::query(
                "INSERT OR IGNORE INTO votes (song_id, participant_id, direction) VALUES (?, ?, ?)",
            )
            .bind(song_id.to_string())
            .bind(participant_id.to_string())
            .bind(direction.as_str())
            .execute(db)
            .await?;
        }
    }

    sqlx::query(
        r#"
        UPDATE songs SET score = (
            SELECT COALESCE(SUM(CASE direction WHEN 'up' THEN 1 ELSE -1 END), 0)
            FROM votes WHERE song_id = ?
        )
        WHERE guid = ?
        "#,
    )
    .bind(song_id.to_string())
    .bind(song_id.to_string())
    .execute(db)
    .await?;

    Ok(())
}
