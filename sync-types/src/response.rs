//! Response-side wire types for the sliding sync endpoint.
//!
//! Deserialization is tolerant: unknown keys are ignored everywhere, and
//! every field except the cursor defaults when missing. The only hard
//! requirement on a 200 response is a string `pos`.

use crate::Range;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A parsed sliding sync response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// The cursor to echo on the next request.
    pub pos: String,
    /// Per-list updates, keyed by list name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lists: BTreeMap<String, ListUpdate>,
    /// Per-room payloads, keyed by room id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rooms: BTreeMap<String, RoomData>,
    /// Extension payloads.
    #[serde(default, skip_serializing_if = "ResponseExtensions::is_empty")]
    pub extensions: ResponseExtensions,
}

impl SyncResponse {
    /// Parse a response from its JSON text.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// The server's view of one list after this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListUpdate {
    /// Total number of rooms matching the list's filter.
    pub count: u64,
    /// Window operations. MSC4186 only ever emits SYNC ops.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<SyncOp>,
}

/// A single list operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncOp {
    /// Operation kind, `"SYNC"` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    /// The window the server has materialized for the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

/// Raw per-room payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    /// Computed room name, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// True on the first time the server sends this room on a connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<bool>,
    /// True when the timeline was truncated.
    #[serde(default)]
    pub limited: bool,
    /// Pagination token for fetching earlier timeline events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_batch: Option<String>,
    /// Raw timeline events, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<Value>,
    /// Raw state events matching the requested `required_state`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_state: Vec<Value>,
    /// Stripped state for an invite. Presence of this field marks the room
    /// as invited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_state: Option<Vec<Value>>,
    /// Membership summary heroes, forwarded verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heroes: Vec<Value>,
    /// Unread notification counters.
    #[serde(default)]
    pub unread_notifications: UnreadNotifications,
    /// Number of joined members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_count: Option<u64>,
    /// Number of invited members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_count: Option<u64>,
    /// Server-side recency stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bump_stamp: Option<u64>,
    /// Number of live events at the end of the timeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_live: Option<u64>,
}

/// Unread counters for one room. Both default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadNotifications {
    /// Events that triggered a highlight.
    #[serde(default)]
    pub highlight_count: u64,
    /// Events that triggered any notification.
    #[serde(default)]
    pub notification_count: u64,
}

/// Extension payloads carried by a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseExtensions {
    /// To-device message delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_device: Option<ToDeviceUpdate>,
    /// Encryption metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e2ee: Option<E2eeUpdate>,
    /// Global and per-room account data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_data: Option<AccountDataUpdate>,
    /// Typing notifications per room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing: Option<TypingUpdate>,
    /// Read receipts per room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipts: Option<ReceiptsUpdate>,
}

impl ResponseExtensions {
    /// True when no extension carried any payload.
    pub fn is_empty(&self) -> bool {
        self.to_device.is_none()
            && self.e2ee.is_none()
            && self.account_data.is_none()
            && self.typing.is_none()
            && self.receipts.is_none()
    }
}

/// To-device messages delivered this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToDeviceUpdate {
    /// Token to feed back as `since` on the next request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_batch: Option<String>,
    /// Raw to-device events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Value>,
}

/// Encryption metadata delivered this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct E2eeUpdate {
    /// Users whose device lists changed or left.
    #[serde(default)]
    pub device_lists: DeviceLists,
    /// Remaining one-time keys per algorithm.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub device_one_time_keys_count: BTreeMap<String, u64>,
    /// Fallback key algorithms that still have an unused key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_unused_fallback_key_types: Option<Vec<String>>,
}

/// Device list churn for the e2ee extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLists {
    /// Users with changed device lists.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<String>,
    /// Users no longer sharing any encrypted room.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub left: Vec<String>,
}

/// Account data delivered this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountDataUpdate {
    /// Global account data events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global: Vec<Value>,
    /// Per-room account data events, keyed by room id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rooms: BTreeMap<String, Vec<Value>>,
}

/// Typing notifications, keyed by room id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingUpdate {
    /// Who is typing, per room.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rooms: BTreeMap<String, TypingNotice>,
}

/// The set of users currently typing in one room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingNotice {
    /// User ids currently typing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<String>,
}

/// Read receipts, keyed by room id. Receipt content is forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptsUpdate {
    /// Receipt EDU content per room.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rooms: BTreeMap<String, Value>,
}

/// Matrix error body carried by non-200 responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code, e.g. `M_UNKNOWN_POS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errcode: Option<String>,
    /// Human-readable error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parse an error body from JSON text.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}
