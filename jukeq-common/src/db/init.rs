//! Database initialization
//!
//! Creates the database on first run and brings the schema up idempotently,
//! so a fresh deployment needs no manual migration step.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode: concurrent readers with one writer, needed for the
    // interleaved vote/selection traffic
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Idempotent - safe to call multiple times
    create_sessions_table(&pool).await?;
    create_participants_table(&pool).await?;
    create_songs_table(&pool).await?;
    create_votes_table(&pool).await?;

    Ok(pool)
}

/// Create sessions table
///
/// "At most one active session" is enforced by the application's conditional
/// insert, not by a storage constraint.
async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            guid TEXT PRIMARY KEY,
            start_time TEXT NOT NULL,
            end_time TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_active ON sessions(active)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create participants table
///
/// Display names are unique per session (not globally), so a name used in a
/// past session can recur in a later one.
async fn create_participants_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS participants (
            guid TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(guid),
            name TEXT NOT NULL,
            color TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(session_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create songs table
async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            guid TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(guid),
            title TEXT NOT NULL,
            source_url TEXT NOT NULL,
            video_id TEXT NOT NULL,
            message TEXT NOT NULL DEFAULT '',
            submitter_id TEXT NOT NULL REFERENCES participants(guid),
            score INTEGER NOT NULL DEFAULT 0,
            playing INTEGER NOT NULL DEFAULT 0,
            played INTEGER NOT NULL DEFAULT 0,
            added_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_songs_session_played ON songs(session_id, played)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create votes table
///
/// The composite primary key makes "at most one vote per (participant, song)"
/// structural.
async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            song_id TEXT NOT NULL REFERENCES songs(guid),
            participant_id TEXT NOT NULL REFERENCES participants(guid),
            direction TEXT NOT NULL CHECK (direction IN ('up', 'down')),
            PRIMARY KEY (song_id, participant_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
