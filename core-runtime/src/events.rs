//! # Event System
//!
//! Broadcast event bus for session lifecycle notifications.
//!
//! The session manager emits a [`CoreEvent`] on every state transition so a
//! host UI can surface progress ("signing in...", "refreshing...") without
//! polling. Subscribers receive events over a tokio broadcast channel; a bus
//! with no subscribers silently drops emissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Default buffer size for the event channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// States of the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No cached session exists.
    NoSession,
    /// A cached session was read and is not yet expired.
    CachedValid,
    /// A cached session was read but its expiry has passed.
    CachedExpired,
    /// A full authentication is in flight.
    Authenticating,
    /// A token refresh is in flight.
    Refreshing,
    /// A usable access token is available.
    Ready,
    /// The lifecycle ended without a usable token.
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::NoSession => "no_session",
            SessionState::CachedValid => "cached_valid",
            SessionState::CachedExpired => "cached_expired",
            SessionState::Authenticating => "authenticating",
            SessionState::Refreshing => "refreshing",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// The session manager moved to a new state.
    StateChanged { state: SessionState },
    /// A session was written to the cache.
    SessionPersisted { expires_at: DateTime<Utc> },
    /// The lifecycle failed; `message` is safe to display.
    AuthFailed { message: String },
}

/// Top-level event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum CoreEvent {
    Auth(AuthEvent),
}

/// Broadcast bus carrying [`CoreEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Emit an event, returning the number of subscribers that received it.
    ///
    /// Emitting onto a bus with no subscribers is not an error.
    pub fn emit(&self, event: CoreEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::default();
        let received = bus.emit(CoreEvent::Auth(AuthEvent::StateChanged {
            state: SessionState::NoSession,
        }));
        assert_eq!(received, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(CoreEvent::Auth(AuthEvent::StateChanged {
            state: SessionState::Authenticating,
        }));
        bus.emit(CoreEvent::Auth(AuthEvent::StateChanged {
            state: SessionState::Ready,
        }));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            CoreEvent::Auth(AuthEvent::StateChanged {
                state: SessionState::Authenticating
            })
        ));
        assert!(matches!(
            second,
            CoreEvent::Auth(AuthEvent::StateChanged {
                state: SessionState::Ready
            })
        ));
    }

    #[test]
    fn test_state_serde_round_trip() {
        let json = serde_json::to_string(&SessionState::CachedExpired).unwrap();
        assert_eq!(json, "\"cached_expired\"");
        let state: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, SessionState::CachedExpired);
    }
}
