//! Event system for the media-list player
//!
//! Two delivery mechanisms live here:
//! - **EventBus** (tokio::broadcast): one-to-many, fire-and-forget delivery
//!   of [`ListPlayerEvent`]s to any number of subscribers
//! - **EventManager**: synchronous observer fan-out used by media lists and
//!   underlying players (see [`manager`])

mod manager;
mod playback_types;

pub use manager::{EventManager, ListenerId};
pub use playback_types::{PlaybackMode, PlayerState};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted by a media-list player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ListPlayerEvent {
    /// A new item was selected and handed to the underlying player
    ///
    /// In repeat mode this fires again for the same item on every advance.
    NextItemSet {
        /// Identity of the selected media
        media_id: Uuid,
        /// Media resource locator of the selected media
        mrl: String,
        /// Root-to-leaf index path of the item in the list tree
        path: Vec<usize>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback was stopped on request and the selection cleared
    Stopped {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Traversal ran off the end of the list without looping
    ListPlayed {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ListPlayerEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            ListPlayerEvent::NextItemSet { .. } => "NextItemSet",
            ListPlayerEvent::Stopped { .. } => "Stopped",
            ListPlayerEvent::ListPlayed { .. } => "ListPlayed",
        }
    }
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mlp_common::events::{EventBus, ListPlayerEvent};
///
/// let event_bus = EventBus::new(16);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(ListPlayerEvent::Stopped {
///     timestamp: chrono::Utc::now(),
/// });
///
/// let received = rx.try_recv().unwrap();
/// assert_eq!(received.event_type(), "Stopped");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ListPlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before
    /// the oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ListPlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ListPlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<ListPlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ListPlayerEvent) {
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

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_without_subscribers_fails() {
        let bus = EventBus::new(4);
        let result = bus.emit(ListPlayerEvent::ListPlayed {
            timestamp: chrono::Utc::now(),
        });
        assert!(result.is_err(), "no subscriber means emit reports an error");
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = ListPlayerEvent::NextItemSet {
            media_id: Uuid::new_v4(),
            mrl: "file:///a.ogg".to_string(),
            path: vec![1, 0],
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(bus.emit(event.clone()).expect("emit should succeed"), 2);

        assert_eq!(rx1.try_recv().expect("rx1 should receive"), event);
        assert_eq!(rx2.try_recv().expect("rx2 should receive"), event);
    }

    #[test]
    fn test_eventbus_emit_lossy_on_full_channel() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for _ in 0..10 {
            bus.emit_lossy(ListPlayerEvent::Stopped {
                timestamp: chrono::Utc::now(),
            });
        }

        // Oldest events were dropped; the receiver is told it lagged
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
    }

    #[test]
    fn test_next_item_set_serialization() {
        let event = ListPlayerEvent::NextItemSet {
            media_id: Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc),
            mrl: "file:///b1.ogg".to_string(),
            path: vec![1, 0],
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).expect("Serialization should succeed");
        assert!(json.contains("\"type\":\"NextItemSet\""));
        assert!(json.contains("\"path\":[1,0]"));

        let back: ListPlayerEvent = serde_json::from_str(&json).expect("Deserialization should succeed");
        assert_eq!(back.event_type(), "NextItemSet");
    }
}
