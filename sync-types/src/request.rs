//! Request-side wire types for the sliding sync endpoint.
//!
//! The request body is JSON. Optional fields are omitted entirely when
//! unset, and the `room_subscriptions` / `extensions` maps are omitted when
//! empty. List and extension entries are kept as ordered pairs so the wire
//! rendering (and the request log) follows insertion order.

use crate::Range;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Extension name for encryption metadata deltas.
pub const EXT_E2EE: &str = "e2ee";
/// Extension name for to-device message delivery.
pub const EXT_TO_DEVICE: &str = "to_device";
/// Extension name for global and per-room account data.
pub const EXT_ACCOUNT_DATA: &str = "account_data";
/// Extension name for typing notifications.
pub const EXT_TYPING: &str = "typing";
/// Extension name for read receipts.
pub const EXT_RECEIPTS: &str = "receipts";

/// The five extensions understood by this engine, in the order
/// `enable_all_extensions` installs them.
pub const ALL_EXTENSIONS: [&str; 5] =
    [EXT_E2EE, EXT_TO_DEVICE, EXT_ACCOUNT_DATA, EXT_TYPING, EXT_RECEIPTS];

/// One sliding sync request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncRequest {
    /// Connection identifier, constant for the lifetime of the engine.
    pub conn_id: String,
    /// Cursor from the previous tick. Absent on the first request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    /// Server-side hold timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Per-list window configuration. Always present, possibly empty.
    #[serde(serialize_with = "serialize_pairs")]
    pub lists: Vec<(String, ListConfig)>,
    /// Explicit per-room subscriptions.
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "serialize_pairs")]
    pub room_subscriptions: Vec<(String, RoomSubscription)>,
    /// Enabled protocol extensions.
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "serialize_pairs")]
    pub extensions: Vec<(String, ExtensionConfig)>,
    /// Presence hint. Sent as a query parameter only, never in the body.
    #[serde(skip_serializing)]
    pub set_presence: Option<Presence>,
}

impl SyncRequest {
    /// Render the request body as a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

fn serialize_pairs<S, T>(pairs: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_map(pairs.iter().map(|(key, value)| (key, value)))
}

/// Wire configuration for a single list, as produced per tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListConfig {
    /// The window to sync. At most one range in this engine; empty when the
    /// list has nothing left to request and only streams updates.
    pub ranges: Vec<Range>,
    /// Number of timeline events requested per room.
    pub timeline_limit: u32,
    /// `(event type, state key)` pairs to include as required state.
    pub required_state: Vec<(String, String)>,
    /// Server-side room filter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<ListFilters>,
}

/// Server-side filter attached to a list.
///
/// All fields are optional; an unset field does not constrain the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilters {
    /// Only direct-message rooms (or only non-DM rooms when false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dm: Option<bool>,
    /// Only encrypted rooms (or only unencrypted when false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_encrypted: Option<bool>,
    /// Only rooms the user has been invited to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_invite: Option<bool>,
    /// Restrict to rooms within these spaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spaces: Option<Vec<String>>,
    /// Restrict to these `m.room.create` room types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_types: Option<Vec<String>>,
}

/// Configuration for an explicit room subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSubscription {
    /// Number of timeline events requested for the subscribed room.
    pub timeline_limit: u32,
    /// `(event type, state key)` pairs to include as required state.
    pub required_state: Vec<(String, String)>,
}

impl RoomSubscription {
    /// Create a subscription with the given timeline limit and no
    /// required state.
    pub fn new(timeline_limit: u32) -> Self {
        Self {
            timeline_limit,
            required_state: Vec::new(),
        }
    }

    /// Set the required state pairs.
    pub fn with_required_state(mut self, required_state: Vec<(String, String)>) -> Self {
        self.required_state = required_state;
        self
    }
}

/// Configuration for one enabled extension.
///
/// Generic extensions carry only the `enabled` flag. The to-device variant
/// additionally feeds the since-token from the previous tick back to the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtensionConfig {
    /// The `to_device` extension with its delivery token.
    ToDevice {
        /// Whether the extension is active.
        enabled: bool,
        /// `next_batch` from the last to-device delivery, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        since: Option<String>,
    },
    /// Any other extension.
    Generic {
        /// Whether the extension is active.
        enabled: bool,
    },
}

impl ExtensionConfig {
    /// Whether this extension is enabled.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::ToDevice { enabled, .. } | Self::Generic { enabled } => *enabled,
        }
    }
}

/// Presence hint communicated alongside a sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Mark the user online.
    Online,
    /// Mark the user offline.
    Offline,
    /// Mark the user idle.
    Unavailable,
}

impl Presence {
    /// The wire string for this presence value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
