//! Session events broadcast to live listeners
//!
//! Events are emitted after a mutation has been applied to the session, so a
//! listener never observes a half-applied state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::{Event, TapRecord};

/// Session change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A tap resolved; `created` is false for a repeat tap
    TapRecorded {
        record: TapRecord,
        created: bool,
        timestamp: DateTime<Utc>,
    },
    /// The roster was replaced and records reclassified
    RosterImported {
        count: usize,
        registered_taps: usize,
        timestamp: DateTime<Utc>,
    },
    /// A new event replaced the previous one
    EventStarted {
        event: Event,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::TapRecorded { .. } => "TapRecorded",
            SessionEvent::RosterImported { .. } => "RosterImported",
            SessionEvent::EventStarted { .. } => "EventStarted",
        }
    }
}

/// Broadcast channel for [`SessionEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// `capacity` events are buffered per subscriber before it lags
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit to current subscribers; having none is not an error.
    ///
    /// Returns the number of subscribers reached.
    pub fn emit(&self, event: SessionEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::new(8);
        let sent = bus.emit(SessionEvent::RosterImported {
            count: 0,
            registered_taps: 0,
            timestamp: Utc::now(),
        });
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let event = SessionEvent::EventStarted {
            event: Event::new("Orientation"),
            timestamp: Utc::now(),
        };

        assert_eq!(bus.emit(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_serialized_with_type_tag() {
        let event = SessionEvent::RosterImported {
            count: 3,
            registered_taps: 1,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RosterImported");
        assert_eq!(json["count"], 3);
        assert_eq!(event.event_type(), "RosterImported");
    }
}
