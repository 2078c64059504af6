//! Resumable engine state.
//!
//! The snapshot covers exactly the subset that survives a process restart:
//! the cursor, the to-device since-token, and each list's synced range and
//! last known total. Everything else (loading states, page offsets) is
//! recomputed on restore.
//!
//! The JSON mapping is a direct structural embedding. Unset fields are
//! omitted on write; missing and unknown keys are tolerated on read, so
//! snapshots from newer versions still load.

use mx_sync_types::Range;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The persistable snapshot of one engine instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    /// Cursor from the last successful tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    /// To-device delivery token from the last successful tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_device_since: Option<String>,
    /// Per-list resumable state, keyed by list name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lists: BTreeMap<String, ListSnapshot>,
}

impl SyncSnapshot {
    /// Serialize to JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON text. Extra keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The resumable subset of one list's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSnapshot {
    /// The synced window, if any response has been observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    /// The last server-reported total, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_room_count: Option<u64>,
}
