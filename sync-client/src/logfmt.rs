//! Human-readable renderings of one tick's request and response.
//!
//! These are part of the engine's observable contract, not incidental
//! debug output: the renderings are deterministic across runs and the
//! tests pin their tokens. Lists and extensions appear in insertion
//! order; response-side maps render in room-id order.

use mx_sync_core::{LoadingState, SyncUpdate};
use mx_sync_types::{SyncRequest, SyncResponse};

/// Render an outgoing request as a multi-line log entry.
pub fn format_request(request: &SyncRequest) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        ">>> REQUEST pos={} timeout={}ms conn_id={}",
        request.pos.as_deref().unwrap_or("null"),
        request.timeout.unwrap_or_default(),
        request.conn_id,
    ));

    for (name, config) in &request.lists {
        let range = match config.ranges.first() {
            Some(range) => range.to_string(),
            None => "[]".to_string(),
        };
        lines.push(format!("  list:{name}={range}"));
    }

    if !request.room_subscriptions.is_empty() {
        let ids: Vec<&str> = request
            .room_subscriptions
            .iter()
            .map(|(id, _)| id.as_str())
            .collect();
        lines.push(format!("  subscriptions=[{}]", ids.join(", ")));
    }

    if !request.extensions.is_empty() {
        let names: Vec<&str> = request
            .extensions
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        lines.push(format!("  extensions=[{}]", names.join(", ")));
    }

    lines.join("\n")
}

/// Render a processed response as a multi-line log entry.
///
/// `list_states` is the engine's lists in insertion order with their
/// post-tick loading states; `fully_synced` is the engine-level predicate
/// after this tick.
pub fn format_response(
    response: &SyncResponse,
    update: &SyncUpdate,
    list_states: &[(String, LoadingState)],
    fully_synced: bool,
) -> String {
    let mut lines = Vec::new();

    lines.push(format!("<<< RESPONSE pos={}", response.pos));

    for (name, list) in &response.lists {
        let mut line = format!("  list:{name} count={}", list.count);
        for op in &list.ops {
            if let Some(range) = op.range {
                line.push_str(&format!(" range={range}"));
            }
        }
        lines.push(line);
    }

    for (name, state) in list_states {
        lines.push(format!("  {name}:{state}"));
    }

    if !update.rooms.is_empty() {
        lines.push(format!("  rooms={} updated", update.rooms.len()));
    }

    for (room_id, room) in &update.rooms.joined {
        let mut line = format!("  room:{room_id}");
        if let Some(name) = &room.name {
            line.push_str(&format!(" name={name}"));
        }
        if room.initial == Some(true) {
            line.push_str(" initial=true");
        }
        if !room.state.is_empty() {
            let types: Vec<&str> = room.state.iter().map(|e| e.event_type.as_str()).collect();
            line.push_str(&format!(" required_state=[{}]", types.join(", ")));
        }
        if !room.timeline.is_empty() {
            line.push_str(&format!(" timeline={} events", room.timeline.len()));
        }
        if room.notification_count > 0 || room.highlight_count > 0 {
            line.push_str(&format!(
                " notifications={} highlights={}",
                room.notification_count, room.highlight_count
            ));
        }
        lines.push(line);
        for event in &room.timeline {
            lines.push(format!("    {} from {}", event.event_type, event.sender));
        }
    }

    for (room_id, room) in &update.rooms.invited {
        let types: Vec<&str> = room
            .invite_state
            .iter()
            .map(|e| e.event_type.as_str())
            .collect();
        lines.push(format!(
            "  invited:{room_id} invite_state=[{}]",
            types.join(", ")
        ));
    }

    for (room_id, room) in &update.rooms.left {
        lines.push(format!(
            "  left:{room_id} timeline={} events",
            room.timeline.len()
        ));
    }

    let extensions = &update.extensions;
    if let Some(to_device) = &extensions.to_device {
        if !to_device.events.is_empty() || to_device.next_batch.is_some() {
            let mut line = format!("  to_device: {} events", to_device.events.len());
            if let Some(next_batch) = &to_device.next_batch {
                line.push_str(&format!(", next_batch={next_batch}"));
            }
            lines.push(line);
        }
    }
    if let Some(e2ee) = &extensions.e2ee {
        lines.push(format!(
            "  e2ee: {} changed, {} left",
            e2ee.device_lists.changed.len(),
            e2ee.device_lists.left.len()
        ));
    }
    if let Some(account_data) = &extensions.account_data {
        if !account_data.global.is_empty() || !account_data.rooms.is_empty() {
            lines.push(format!(
                "  account_data: {} global, {} rooms",
                account_data.global.len(),
                account_data.rooms.len()
            ));
        }
    }
    if let Some(typing) = &extensions.typing {
        if !typing.rooms.is_empty() {
            lines.push(format!("  typing: {} rooms", typing.rooms.len()));
        }
    }
    if let Some(receipts) = &extensions.receipts {
        if !receipts.rooms.is_empty() {
            lines.push(format!("  receipts: {} rooms", receipts.rooms.len()));
        }
    }

    if fully_synced {
        lines.push("  [FULLY SYNCED]".to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mx_sync_core::classify_rooms;
    use mx_sync_types::{ExtensionConfig, ListConfig, Range, RoomSubscription};
    use serde_json::json;

    fn request_with_list() -> SyncRequest {
        SyncRequest {
            conn_id: "main".into(),
            pos: Some("tok_1".into()),
            timeout: Some(30000),
            lists: vec![(
                "all_rooms".into(),
                ListConfig {
                    ranges: vec![Range::new(0, 19)],
                    timeline_limit: 10,
                    required_state: Vec::new(),
                    filters: None,
                },
            )],
            room_subscriptions: Vec::new(),
            extensions: Vec::new(),
            set_presence: None,
        }
    }

    fn update_for(response: &SyncResponse) -> SyncUpdate {
        SyncUpdate {
            pos: response.pos.clone(),
            updated_lists: response.lists.keys().cloned().collect(),
            rooms: classify_rooms(response, Some("@me:x")),
            extensions: response.extensions.clone(),
        }
    }

    // ===========================================
    // Request Rendering
    // ===========================================

    #[test]
    fn request_log_carries_the_header_tokens() {
        let log = format_request(&request_with_list());
        assert!(log.starts_with(">>> REQUEST"));
        assert!(log.contains("pos=tok_1"));
        assert!(log.contains("timeout=30000ms"));
        assert!(log.contains("conn_id=main"));
        assert!(log.contains("list:all_rooms=[0, 19]"));
    }

    #[test]
    fn request_log_renders_null_pos() {
        let mut request = request_with_list();
        request.pos = None;
        let log = format_request(&request);
        assert!(log.contains("pos=null"));
    }

    #[test]
    fn request_log_lists_subscriptions_and_extensions_when_present() {
        let mut request = request_with_list();
        request
            .room_subscriptions
            .push(("!a:x".into(), RoomSubscription::new(20)));
        request
            .extensions
            .push(("e2ee".into(), ExtensionConfig::Generic { enabled: true }));
        request.extensions.push((
            "to_device".into(),
            ExtensionConfig::ToDevice {
                enabled: true,
                since: None,
            },
        ));

        let log = format_request(&request);
        assert!(log.contains("subscriptions=[!a:x]"));
        assert!(log.contains("extensions=[e2ee, to_device]"));
    }

    #[test]
    fn request_log_omits_empty_sections() {
        let log = format_request(&request_with_list());
        assert!(!log.contains("subscriptions="));
        assert!(!log.contains("extensions="));
    }

    #[test]
    fn exhausted_list_renders_an_empty_range() {
        let mut request = request_with_list();
        request.lists[0].1.ranges.clear();
        let log = format_request(&request);
        assert!(log.contains("list:all_rooms=[]"));
    }

    // ===========================================
    // Response Rendering
    // ===========================================

    #[test]
    fn response_log_carries_list_counts_and_states() {
        let response = SyncResponse::from_json(
            &json!({
                "pos": "tok_2",
                "lists": {"all_rooms": {"count": 50, "ops": [{"op": "SYNC", "range": [0, 19]}]}},
            })
            .to_string(),
        )
        .unwrap();
        let update = update_for(&response);
        let log = format_response(
            &response,
            &update,
            &[("all_rooms".into(), LoadingState::PartiallyLoaded)],
            false,
        );
        assert!(log.starts_with("<<< RESPONSE pos=tok_2"));
        assert!(log.contains("list:all_rooms count=50 range=[0, 19]"));
        assert!(log.contains("all_rooms:partially_loaded"));
        assert!(!log.contains("[FULLY SYNCED]"));
    }

    #[test]
    fn response_log_renders_room_blocks() {
        let response = SyncResponse::from_json(
            &json!({
                "pos": "p",
                "rooms": {"!a:x": {
                    "name": "Alpha",
                    "initial": true,
                    "timeline": [
                        {"type": "m.room.message", "sender": "@u:x", "content": {}},
                        {"type": "m.room.message", "sender": "@v:x", "content": {}},
                    ],
                    "required_state": [
                        {"type": "m.room.name", "sender": "@u:x", "state_key": "", "content": {}},
                    ],
                    "unread_notifications": {"highlight_count": 1, "notification_count": 4},
                }},
            })
            .to_string(),
        )
        .unwrap();
        let update = update_for(&response);
        let log = format_response(&response, &update, &[], false);
        assert!(log.contains("rooms=1 updated"));
        assert!(log.contains("room:!a:x"));
        assert!(log.contains("name=Alpha"));
        assert!(log.contains("initial=true"));
        assert!(log.contains("required_state=[m.room.name]"));
        assert!(log.contains("timeline=2 events"));
        assert!(log.contains("notifications=4 highlights=1"));
        assert!(log.contains("m.room.message from @u:x"));
    }

    #[test]
    fn response_log_renders_invites() {
        let response = SyncResponse::from_json(
            &json!({
                "pos": "p",
                "rooms": {"!b:x": {"invite_state": [
                    {"type": "m.room.member", "sender": "@i:x", "state_key": "@me:x",
                     "content": {"membership": "invite"}},
                    {"type": "m.room.name", "sender": "@i:x", "state_key": "",
                     "content": {"name": "Beta"}},
                ]}},
            })
            .to_string(),
        )
        .unwrap();
        let update = update_for(&response);
        let log = format_response(&response, &update, &[], false);
        assert!(log.contains("invited:!b:x invite_state=[m.room.member, m.room.name]"));
    }

    #[test]
    fn response_log_renders_extension_sections() {
        let response = SyncResponse::from_json(
            &json!({
                "pos": "p",
                "extensions": {
                    "to_device": {"next_batch": "td_2", "events": [{}, {}]},
                    "e2ee": {"device_lists": {"changed": ["@u:x"]}},
                    "account_data": {"global": [{"type": "m.push_rules", "content": {}}]},
                    "typing": {"rooms": {"!a:x": {"user_ids": ["@u:x"]}}},
                    "receipts": {"rooms": {"!a:x": {}}},
                },
            })
            .to_string(),
        )
        .unwrap();
        let update = update_for(&response);
        let log = format_response(&response, &update, &[], false);
        assert!(log.contains("to_device: 2 events, next_batch=td_2"));
        assert!(log.contains("e2ee: 1 changed, 0 left"));
        assert!(log.contains("account_data: 1 global, 0 rooms"));
        assert!(log.contains("typing: 1 rooms"));
        assert!(log.contains("receipts: 1 rooms"));
    }

    #[test]
    fn fully_synced_marker_is_appended() {
        let response = SyncResponse::from_json(r#"{"pos": "p"}"#).unwrap();
        let update = update_for(&response);
        let log = format_response(
            &response,
            &update,
            &[("all_rooms".into(), LoadingState::FullyLoaded)],
            true,
        );
        assert!(log.ends_with("[FULLY SYNCED]"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let response = SyncResponse::from_json(
            &json!({
                "pos": "p",
                "rooms": {"!b:x": {"name": "Beta"}, "!a:x": {"name": "Alpha"}},
            })
            .to_string(),
        )
        .unwrap();
        let update = update_for(&response);
        let first = format_response(&response, &update, &[], false);
        let second = format_response(&response, &update, &[], false);
        assert_eq!(first, second);
        // Room-id order, regardless of arrival order.
        let alpha = first.find("room:!a:x").unwrap();
        let beta = first.find("room:!b:x").unwrap();
        assert!(alpha < beta);
    }
}
