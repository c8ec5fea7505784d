//! Event — an immutable record of something that happened, broadcast on
//! the in-process bus and relayed to browsers over SSE.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::{Timestamp, now};
use crate::zone::ZoneId;

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A zone's state changed (from the Home Assistant event stream or a
    /// command issued through the API).
    ZoneUpdated,
    /// A zone disappeared or became unreadable.
    ZoneRemoved,
    /// A schedule entry was created, replaced, or removed.
    ScheduleChanged,
    /// A synchronization pass finished.
    SyncCompleted,
}

/// One broadcast event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub zone_id: Option<ZoneId>,
    /// Event-specific payload, e.g. the updated zone as JSON.
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, zone_id: Option<ZoneId>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            zone_id,
            data,
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stamp_new_events_with_fresh_id_and_time() {
        let before = now();
        let event = Event::new(EventType::ZoneUpdated, None, serde_json::json!({}));
        assert!(event.timestamp >= before);

        let other = Event::new(EventType::ZoneUpdated, None, serde_json::json!({}));
        assert_ne!(event.id, other.id);
    }

    #[test]
    fn should_roundtrip_event_through_serde_json() {
        let event = Event::new(
            EventType::ScheduleChanged,
            Some("living_room".parse().unwrap()),
            serde_json::json!({"entries": 2}),
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, event.id);
        assert_eq!(parsed.event_type, EventType::ScheduleChanged);
        assert_eq!(parsed.zone_id, event.zone_id);
    }

    #[test]
    fn should_serialize_event_type_as_snake_case() {
        let json = serde_json::to_string(&EventType::SyncCompleted).unwrap();
        assert_eq!(json, "\"sync_completed\"");
    }
}
