//! SSE broadcaster for real-time client updates
//!
//! The broadcast gateway: fans every published event out to all connected
//! viewer channels. Delivery is best-effort/at-most-once per channel - no
//! replay, no acknowledgment - so a viewer that misses an event reconciles by
//! refetching current state on (re)connect. The subscriber set is
//! process-local and rebuilt from scratch on restart.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use jukeq_common::events::QueueEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

/// EventBus manages viewer connections and event distribution
///
/// Injected into each core component at construction; tests subscribe to
/// assert emissions or simply let publishes fall on zero receivers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    /// Create a new event bus
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer per lagging subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all connected viewers
    ///
    /// Lossy: zero subscribers is not an error, and a disconnected
    /// viewer never surfaces back to the mutation that triggered the publish.
    /// Publishes happen after the triggering mutation committed, in commit
    /// order.
    pub fn publish(&self, event: QueueEvent) {
        match self.tx.send(event) {
            Ok(count) => debug!("broadcast event to {} viewers", count),
            Err(_) => debug!("no viewers connected, event dropped"),
        }
    }

    /// Subscribe to the raw event stream (used by tests and the SSE handler)
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    /// Current number of connected viewers
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Create an SSE stream for a new viewer connection
    pub fn subscribe_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        let rx = self.tx.subscribe();

        BroadcastStream::new(rx).filter_map(|result| async move {
            match result {
                Ok(event) => {
                    let sse = Event::default()
                        .event(event.event_type())
                        .json_data(event.payload());
                    match sse {
                        Ok(sse) => Some(Ok(sse)),
                        Err(e) => {
                            warn!("failed to serialize SSE event: {}", e);
                            None
                        }
                    }
                }
                Err(e) => {
                    // Lagged or closed receiver; the viewer refetches on reconnect
                    warn!("SSE viewer error: {:?}", e);
                    None
                }
            }
        })
    }

    /// Axum SSE response for GET /events
    pub fn handle_sse_connection(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        info!("new SSE viewer connected, total viewers: {}", self.viewer_count() + 1);

        Sse::new(self.subscribe_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keep-alive"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_with_no_viewers_is_silent() {
        let bus = EventBus::new(16);
        // Must not panic or error
        bus.publish(QueueEvent::SessionUpdated { session: None });
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_publish_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(QueueEvent::SessionUpdated { session: None });
        bus.publish(QueueEvent::PlaylistUpdated { playlist: vec![] });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type(), "session_updated");
        assert_eq!(second.event_type(), "playlist_updated");
    }

    #[tokio::test]
    async fn each_viewer_gets_its_own_copy() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.viewer_count(), 2);

        bus.publish(QueueEvent::PlaylistUpdated { playlist: vec![] });

        assert_eq!(rx1.recv().await.unwrap().event_type(), "playlist_updated");
        assert_eq!(rx2.recv().await.unwrap().event_type(), "playlist_updated");
    }
}
