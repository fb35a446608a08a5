//! Client event bus
//!
//! Replaces the window-level "authChanged" event of a browser client with an explicit
//! publish/subscribe channel. Subscribers are created when components are wired
//! together, so every consumer of a signal is visible at construction time.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why the authentication state changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthChangeReason {
    /// Credentials accepted and tokens stored
    SignedIn,
    /// User logged out; stored tokens cleared
    SignedOut,
}

/// MUVI client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Login or logout happened
    ///
    /// Triggers:
    /// - Session tracker: re-check the current session
    /// - Favorites synchronizer: reload for a new user, or clear
    AuthChanged {
        reason: AuthChangeReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Favorites list contents changed (load, toggle, clear)
    FavoritesChanged {
        count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ClientEvent {
    pub fn auth_changed(reason: AuthChangeReason) -> Self {
        ClientEvent::AuthChanged {
            reason,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn favorites_changed(count: usize) -> Self {
        ClientEvent::FavoritesChanged {
            count,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Broadcast channel for [`ClientEvent`]s
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped (a lagging subscriber sees `RecvError::Lagged`).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ClientEvent,
    ) -> Result<usize, broadcast::error::SendError<ClientEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_auth_changed() {
        let bus = EventBus::new(16);
        let mut session_rx = bus.subscribe();
        let mut favorites_rx = bus.subscribe();

        let delivered = bus
            .emit(ClientEvent::auth_changed(AuthChangeReason::SignedIn))
            .expect("two subscribers are listening");
        assert_eq!(delivered, 2);

        for rx in [&mut session_rx, &mut favorites_rx] {
            match rx.recv().await.unwrap() {
                ClientEvent::AuthChanged { reason, .. } => {
                    assert_eq!(reason, AuthChangeReason::SignedIn)
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        assert!(bus
            .emit(ClientEvent::auth_changed(AuthChangeReason::SignedOut))
            .is_err());

        // Lossy emit never fails
        bus.emit_lossy(ClientEvent::favorites_changed(0));
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 4);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(ClientEvent::favorites_changed(3)).unwrap();
        assert_eq!(json["type"], "FavoritesChanged");
        assert_eq!(json["count"], 3);
    }
}
