//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vote direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }

    pub fn parse(s: &str) -> Option<VoteDirection> {
        match s {
            "up" => Some(VoteDirection::Up),
            "down" => Some(VoteDirection::Down),
            _ => None,
        }
    }

    /// Contribution of one standing vote to a song's score
    pub fn weight(&self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// A single standing vote on a song
///
/// Keyed by participant in storage, so "at most one vote per participant per
/// song" holds structurally rather than by scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub participant_id: Uuid,
    pub direction: VoteDirection,
}

/// A bounded submission/voting period; at most one active at a time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub guid: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_by: String,
}

/// A person identified by a self-chosen display name, scoped to one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub guid: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One submitted track with its votes, score, and lifecycle flags
///
/// Lifecycle: queued (`!playing && !played`) -> playing -> played. `played`
/// is terminal; a played song never reappears in ranking or selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub guid: Uuid,
    pub session_id: Uuid,
    pub title: String,
    pub source_url: String,
    pub video_id: String,
    pub message: String,
    pub submitter_id: Uuid,
    /// Display name of the submitter, joined in at read time
    pub submitter_name: String,
    pub votes: Vec<Vote>,
    /// Net vote count: #up - #down
    pub score: i64,
    pub playing: bool,
    pub played: bool,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trip() {
        assert_eq!(VoteDirection::parse("up"), Some(VoteDirection::Up));
        assert_eq!(VoteDirection::parse("down"), Some(VoteDirection::Down));
        assert_eq!(VoteDirection::parse("sideways"), None);
        assert_eq!(VoteDirection::Up.as_str(), "up");
        assert_eq!(VoteDirection::Down.as_str(), "down");
    }

    #[test]
    fn direction_weights() {
        assert_eq!(VoteDirection::Up.weight(), 1);
        assert_eq!(VoteDirection::Down.weight(), -1);
    }

    #[test]
    fn direction_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&VoteDirection::Up).unwrap(), "\"up\"");
        let parsed: VoteDirection = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(parsed, VoteDirection::Down);
    }
}
