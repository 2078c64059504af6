//! Typed event records parsed out of raw response payloads.
//!
//! Parsing is tolerant: an event that lacks a `type` is skipped rather than
//! failing the tick. Content stays an opaque JSON value; this crate never
//! interprets event bodies beyond the membership lookup the classifier
//! needs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A timeline or state event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    /// Event type, e.g. `m.room.message`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Sender user id.
    #[serde(default)]
    pub sender: String,
    /// Event id, absent on stripped shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Origin server timestamp in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_server_ts: Option<u64>,
    /// State key. Present iff this is a state event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    /// Event content, uninterpreted.
    #[serde(default)]
    pub content: Value,
}

impl RoomEvent {
    /// Parse one raw event, returning `None` when the shape is unusable.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        serde_json::from_value(raw.clone()).ok()
    }

    /// Parse a batch of raw events, dropping unusable entries.
    pub fn parse_all(raw: &[Value]) -> Vec<Self> {
        raw.iter().filter_map(Self::from_raw).collect()
    }

    /// The `membership` field of an `m.room.member` content, if present.
    pub fn membership(&self) -> Option<&str> {
        self.content.get("membership")?.as_str()
    }
}

/// A stripped state event, as carried in `invite_state`.
///
/// Stripped events lack `event_id` and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrippedStateEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Sender user id.
    #[serde(default)]
    pub sender: String,
    /// State key.
    #[serde(default)]
    pub state_key: String,
    /// Event content, uninterpreted.
    #[serde(default)]
    pub content: Value,
}

impl StrippedStateEvent {
    /// Parse a batch of raw stripped events, dropping unusable entries.
    pub fn parse_all(raw: &[Value]) -> Vec<Self> {
        raw.iter()
            .filter_map(|value| serde_json::from_value(value.clone()).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_message_event() {
        let raw = json!({
            "type": "m.room.message",
            "sender": "@u:x",
            "event_id": "$1",
            "origin_server_ts": 1_700_000_000_000u64,
            "content": {"body": "hi", "msgtype": "m.text"},
        });
        let event = RoomEvent::from_raw(&raw).unwrap();
        assert_eq!(event.event_type, "m.room.message");
        assert_eq!(event.sender, "@u:x");
        assert!(event.state_key.is_none());
    }

    #[test]
    fn membership_lookup_reads_content() {
        let raw = json!({
            "type": "m.room.member",
            "sender": "@u:x",
            "state_key": "@u:x",
            "content": {"membership": "leave"},
        });
        let event = RoomEvent::from_raw(&raw).unwrap();
        assert_eq!(event.membership(), Some("leave"));
    }

    #[test]
    fn events_without_a_type_are_dropped() {
        let raw = vec![
            json!({"sender": "@u:x", "content": {}}),
            json!({"type": "m.room.message", "sender": "@u:x", "content": {}}),
            json!("not an object"),
        ];
        let events = RoomEvent::parse_all(&raw);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn stripped_events_parse_without_event_id() {
        let raw = vec![json!({
            "type": "m.room.member",
            "sender": "@inviter:x",
            "state_key": "@me:x",
            "content": {"membership": "invite"},
        })];
        let events = StrippedStateEvent::parse_all(&raw);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state_key, "@me:x");
    }
}
