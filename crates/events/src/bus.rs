//! Session event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`SessionBus`] is shared via `Arc<SessionBus>` between the HTTP client
//! (publisher) and the session store (subscriber).

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// A session-level event.
///
/// The unauthorized signal carries no payload in meaning; the timestamp
/// exists for logging only.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The backend rejected a request with 401, 403, or 419. The persisted
    /// token has already been cleared by the time this is published.
    Unauthorized {
        /// When the failing response was classified (UTC).
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Build an unauthorized event stamped with the current time.
    pub fn unauthorized() -> Self {
        SessionEvent::Unauthorized { at: Utc::now() }
    }
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 32;

/// In-process fan-out bus for [`SessionEvent`]s.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers independently
/// receive every published event.
pub struct SessionBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped; the send error
    /// only means there are no receivers.
    pub fn publish(&self, event: SessionEvent) {
        tracing::debug!(?event, "publishing session event");
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
