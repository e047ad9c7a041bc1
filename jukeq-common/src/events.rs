//! Event types broadcast to connected viewers
//!
//! Mutations in the core components publish these over the SSE broadcaster.
//! Delivery is best-effort/at-most-once per subscriber; a viewer that misses
//! an event reconciles by refetching current state on (re)connect.

use crate::db::models::{Session, Song};
use serde::Serialize;

/// State-change events fanned out to all connected viewers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    /// The active session changed; `None` signals viewers to clear their
    /// local playlist view
    SessionUpdated { session: Option<Session> },

    /// The ranked playlist changed; the playing song (if any) comes first
    PlaylistUpdated { playlist: Vec<Song> },
}

impl QueueEvent {
    /// SSE event-type name
    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::SessionUpdated { .. } => "session_updated",
            QueueEvent::PlaylistUpdated { .. } => "playlist_updated",
        }
    }

    /// Event payload as JSON, without the type tag
    ///
    /// SSE frames already name the event type in the `event:` field, so the
    /// data field carries the bare payload (the session or the ranked array).
    pub fn payload(&self) -> serde_json::Value {
        match self {
            QueueEvent::SessionUpdated { session } => {
                serde_json::to_value(session).unwrap_or(serde_json::Value::Null)
            }
            QueueEvent::PlaylistUpdated { playlist } => {
                serde_json::to_value(playlist).unwrap_or(serde_json::Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names() {
        let ended = QueueEvent::SessionUpdated { session: None };
        assert_eq!(ended.event_type(), "session_updated");

        let playlist = QueueEvent::PlaylistUpdated { playlist: vec![] };
        assert_eq!(playlist.event_type(), "playlist_updated");
    }

    #[test]
    fn ended_session_payload_is_null() {
        let ended = QueueEvent::SessionUpdated { session: None };
        assert_eq!(ended.payload(), serde_json::Value::Null);
    }

    #[test]
    fn empty_playlist_payload_is_empty_array() {
        let playlist = QueueEvent::PlaylistUpdated { playlist: vec![] };
        assert_eq!(playlist.payload(), serde_json::json!([]));
    }
}
