//! Playlist ranking
//!
//! Produces the ordered queue view: the playing song (if any) pinned first,
//! then the queued songs by score descending with earlier submissions winning
//! ties. Played songs never appear. Pure over store state; no side effects
//! beyond the read.

use jukeq_common::db::models::Song;
use jukeq_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// The ranked playlist for a session
pub async fn rank(db: &SqlitePool, session_id: Uuid) -> Result<Vec<Song>> {
    let songs = crate::store::unplayed_songs(db, session_id).await?;
    Ok(order(songs))
}

/// Deterministic ordering over non-played songs
///
/// Keys: playing first, then score descending, then submission time
/// ascending. The sort is stable, so the store's insertion order is the final
/// tiebreak and repeated calls on unchanged input yield an identical order.
pub fn order(mut songs: Vec<Song>) -> Vec<Song> {
    songs.sort_by(|a, b| {
        b.playing
            .cmp(&a.playing)
            .then(b.score.cmp(&a.score))
            .then(a.added_at.cmp(&b.added_at))
    });
    songs
}
