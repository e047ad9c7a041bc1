//! Common error types for jukeq

use thiserror::Error;

/// Common result type for jukeq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by every jukeq component
///
/// The core components return these kinds directly; the HTTP layer owns the
/// mapping to status codes.
#[derive(Error, Debug)]
pub enum Error {
    /// Session start attempted outside the configured allowed hours
    #[error("Admission window closed: {0}")]
    AdmissionWindow(String),

    /// Attempted transition that lost to a concurrent one (double session
    /// start, duplicate song, double song activation)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Referenced session/song/participant does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation against a session that is no longer active
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Operation forbidden by the target's current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Submitted message failed content heuristics
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Video metadata resolution failed or timed out
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable kind name, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AdmissionWindow(_) => "admission_window",
            Error::Conflict(_) => "conflict",
            Error::NotFound(_) => "not_found",
            Error::SessionClosed(_) => "session_closed",
            Error::InvalidState(_) => "invalid_state",
            Error::InvalidMessage(_) => "invalid_message",
            Error::InvalidInput(_) => "invalid_input",
            Error::Upstream(_) => "upstream",
            Error::Database(_) => "storage",
            Error::Io(_) => "io",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
        }
    }
}
