//! Session lifecycle
//!
//! Enforces at-most-one active session and the time-of-day admission window.
//! Holds no state of its own; every call is a read-modify-write through the
//! store.

use crate::sse::EventBus;
use crate::store;
use chrono::{Timelike, Utc};
use jukeq_common::config::AdmissionWindow;
use jukeq_common::db::models::Session;
use jukeq_common::events::QueueEvent;
use jukeq_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct SessionManager {
    db: SqlitePool,
    events: EventBus,
    window: AdmissionWindow,
}

impl SessionManager {
    pub fn new(db: SqlitePool, events: EventBus, window: AdmissionWindow) -> Self {
        Self { db, events, window }
    }

    /// Start a new session on behalf of `actor`
    ///
    /// Fails with `AdmissionWindow` outside the configured hours and with
    /// `Conflict` when a session is already active. Activation is a
    /// conditional insert, so two concurrent starts cannot both succeed.
    pub async fn start_session(&self, actor: &str) -> Result<Session> {
        let hour = chrono::Local::now().hour();
        if !self.window.allows(hour) {
            return Err(Error::AdmissionWindow(format!(
                "sessions may only start between {:02}:00 and {:02}:00",
                self.window.open_hour, self.window.close_hour
            )));
        }

        let session = Session {
            guid: Uuid::new_v4(),
            start_time: Utc::now(),
            end_time: None,
            active: true,
            created_by: actor.to_string(),
        };

        if !store::create_session_if_none_active(&self.db, &session).await? {
            return Err(Error::Conflict("a session is already active".to_string()));
        }

        info!(session = %session.guid, actor, "session started");
        self.events.publish(QueueEvent::SessionUpdated {
            session: Some(session.clone()),
        });

        Ok(session)
    }

    /// End the active session
    ///
    /// Broadcasts a null session so viewers clear their playlist view.
    pub async fn end_session(&self) -> Result<Session> {
        let mut session = store::find_active_session(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound("no active session".to_string()))?;

        let end_time = Utc::now();
        if !store::close_session(&self.db, session.guid, end_time).await? {
            // A concurrent end won between our read and the guarded update
            return Err(Error::Conflict("session already ended".to_string()));
        }

        session.active = false;
        session.end_time = Some(end_time);

        info!(session = %session.guid, "session ended");
        self.events.publish(QueueEvent::SessionUpdated { session: None });

        Ok(session)
    }

    /// The current active session, if any; pure read
    pub async fn active_session(&self) -> Result<Option<Session>> {
        store::find_active_session(&self.db).await
    }
}
