//! Response classification.
//!
//! Splits a raw sync response into joined, invited, and left room updates
//! and merges per-room extension payloads into the joined entries. The
//! classifier is pure: it reads the response (and optionally the current
//! user id) and never touches cursor or list state.

use mx_sync_types::{
    ResponseExtensions, RoomEvent, StrippedStateEvent, SyncResponse,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Per-tick output of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncUpdate {
    /// Cursor returned by this tick.
    pub pos: String,
    /// Names of known lists the response updated, in name order.
    pub updated_lists: Vec<String>,
    /// Room updates classified by membership.
    pub rooms: RoomUpdates,
    /// Extension payloads, forwarded from the response.
    pub extensions: ResponseExtensions,
}

/// Room updates classified by membership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomUpdates {
    /// Rooms the user is joined to, keyed by room id.
    pub joined: BTreeMap<String, JoinedRoomUpdate>,
    /// Rooms the user has been invited to.
    pub invited: BTreeMap<String, InvitedRoomUpdate>,
    /// Rooms the user has left or been banned from.
    pub left: BTreeMap<String, LeftRoomUpdate>,
}

impl RoomUpdates {
    /// Total number of room updates across all three classes.
    pub fn len(&self) -> usize {
        self.joined.len() + self.invited.len() + self.left.len()
    }

    /// True when no room changed this tick.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Update for a joined room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinedRoomUpdate {
    /// Computed room name, when the server sent one.
    pub name: Option<String>,
    /// True the first time the server sends this room on a connection.
    pub initial: Option<bool>,
    /// True when the timeline was truncated.
    pub limited: bool,
    /// Pagination token for earlier timeline events.
    pub prev_batch: Option<String>,
    /// Timeline events, oldest first.
    pub timeline: Vec<RoomEvent>,
    /// State events matching the requested required state.
    pub state: Vec<RoomEvent>,
    /// Events that triggered a highlight.
    pub highlight_count: u64,
    /// Events that triggered any notification.
    pub notification_count: u64,
    /// Number of joined members.
    pub joined_count: Option<u64>,
    /// Number of invited members.
    pub invited_count: Option<u64>,
    /// Server-side recency stamp, forwarded verbatim.
    pub bump_stamp: Option<u64>,
    /// Number of live events at the end of the timeline.
    pub num_live: Option<u64>,
    /// Membership summary heroes, forwarded verbatim.
    pub heroes: Vec<Value>,
    /// Per-room account data events.
    pub account_data: Vec<Value>,
    /// Users currently typing in this room.
    pub typing_user_ids: Vec<String>,
    /// Receipt EDU content for this room, forwarded verbatim.
    pub receipts: Option<Value>,
}

/// Update for an invited room: the stripped invite state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvitedRoomUpdate {
    /// Stripped state events carried by the invite.
    pub invite_state: Vec<StrippedStateEvent>,
}

/// Update for a room the user left or was banned from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeftRoomUpdate {
    /// Timeline events up to the departure.
    pub timeline: Vec<RoomEvent>,
    /// State events from the response.
    pub state: Vec<RoomEvent>,
}

/// Classify every room in the response.
///
/// Rooms that appear only in per-room extension payloads (typing, receipts,
/// account data) still surface as joined updates carrying just their
/// extension data; this is how ephemeral updates arrive between
/// timeline-bearing ticks.
pub fn classify_rooms(response: &SyncResponse, user_id: Option<&str>) -> RoomUpdates {
    let mut updates = RoomUpdates::default();

    for (room_id, raw) in &response.rooms {
        if let Some(invite_state) = &raw.invite_state {
            updates.invited.insert(
                room_id.clone(),
                InvitedRoomUpdate {
                    invite_state: StrippedStateEvent::parse_all(invite_state),
                },
            );
            continue;
        }

        let timeline = RoomEvent::parse_all(&raw.timeline);
        let state = RoomEvent::parse_all(&raw.required_state);

        if let Some(user_id) = user_id {
            if has_departed(&state, user_id) {
                updates
                    .left
                    .insert(room_id.clone(), LeftRoomUpdate { timeline, state });
                continue;
            }
        }

        let mut joined = JoinedRoomUpdate {
            name: raw.name.clone(),
            initial: raw.initial,
            limited: raw.limited,
            prev_batch: raw.prev_batch.clone(),
            timeline,
            state,
            highlight_count: raw.unread_notifications.highlight_count,
            notification_count: raw.unread_notifications.notification_count,
            joined_count: raw.joined_count,
            invited_count: raw.invited_count,
            bump_stamp: raw.bump_stamp,
            num_live: raw.num_live,
            heroes: raw.heroes.clone(),
            ..JoinedRoomUpdate::default()
        };
        merge_room_extensions(&mut joined, room_id, &response.extensions);
        updates.joined.insert(room_id.clone(), joined);
    }

    for room_id in extension_room_ids(&response.extensions) {
        if response.rooms.contains_key(&room_id) {
            continue;
        }
        let mut joined = JoinedRoomUpdate::default();
        merge_room_extensions(&mut joined, &room_id, &response.extensions);
        updates.joined.insert(room_id, joined);
    }

    updates
}

/// True when the required state shows the user leaving or banned.
fn has_departed(state: &[RoomEvent], user_id: &str) -> bool {
    state.iter().any(|event| {
        event.event_type == "m.room.member"
            && event.state_key.as_deref() == Some(user_id)
            && matches!(event.membership(), Some("leave" | "ban"))
    })
}

/// Union of room ids named by per-room extension payloads.
fn extension_room_ids(extensions: &ResponseExtensions) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    if let Some(account_data) = &extensions.account_data {
        ids.extend(account_data.rooms.keys().cloned());
    }
    if let Some(typing) = &extensions.typing {
        ids.extend(typing.rooms.keys().cloned());
    }
    if let Some(receipts) = &extensions.receipts {
        ids.extend(receipts.rooms.keys().cloned());
    }
    ids
}

fn merge_room_extensions(
    update: &mut JoinedRoomUpdate,
    room_id: &str,
    extensions: &ResponseExtensions,
) {
    if let Some(account_data) = &extensions.account_data {
        if let Some(events) = account_data.rooms.get(room_id) {
            update.account_data = events.clone();
        }
    }
    if let Some(typing) = &extensions.typing {
        if let Some(notice) = typing.rooms.get(room_id) {
            update.typing_user_ids = notice.user_ids.clone();
        }
    }
    if let Some(receipts) = &extensions.receipts {
        if let Some(content) = receipts.rooms.get(room_id) {
            update.receipts = Some(content.clone());
        }
    }
}
