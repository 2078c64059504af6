//! End-to-end sync scenarios over the mock transport.
//!
//! Each test drives whole ticks through `sync_once`, asserting on the wire
//! requests the engine produced and on the updates it returned.

use mx_sync_client::{ClientError, MockTransport, RequestOverrides, SlidingSync, SlidingSyncConfig};
use mx_sync_core::{LoadingState, RoomList, SyncSnapshot};
use mx_sync_types::{Range, RoomSubscription, EXT_TO_DEVICE};
use serde_json::json;

const HOMESERVER: &str = "https://hs.example";
const TOKEN: &str = "syt_token";
const USER: &str = "@me:hs.example";

fn engine() -> (SlidingSync<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    let sync = SlidingSync::new(SlidingSyncConfig::new("main"), transport.clone());
    (sync, transport)
}

/// A response echoing one SYNC op for the named list.
fn echo_response(pos: &str, list: &str, count: u64, range: (u64, u64)) -> serde_json::Value {
    json!({
        "pos": pos,
        "lists": {list: {"count": count, "ops": [{"op": "SYNC", "range": [range.0, range.1]}]}},
    })
}

/// The `ranges` array the given request sent for the given list.
fn sent_ranges(request: &mx_sync_client::TransportRequest, list: &str) -> serde_json::Value {
    request.body["lists"][list]["ranges"].clone()
}

#[tokio::test]
async fn growing_list_covers_fifty_rooms_in_five_ticks() {
    let (mut sync, transport) = engine();
    sync.add_list(RoomList::growing("all_rooms", 10));

    for (tick, end) in [9u64, 19, 29, 39, 49].iter().enumerate() {
        transport.queue_ok(&echo_response(
            &format!("tok_{tick}"),
            "all_rooms",
            50,
            (0, *end),
        ));
        let update = sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
        assert_eq!(update.updated_lists, vec!["all_rooms".to_string()]);
    }

    let requests = transport.sent_requests();
    let windows: Vec<serde_json::Value> = requests
        .iter()
        .map(|r| sent_ranges(r, "all_rooms"))
        .collect();
    assert_eq!(
        windows,
        vec![
            json!([[0, 9]]),
            json!([[0, 19]]),
            json!([[0, 29]]),
            json!([[0, 39]]),
            json!([[0, 49]]),
        ]
    );
    assert!(sync.list("all_rooms").unwrap().is_fully_loaded());
    assert!(sync.is_fully_synced());
}

#[tokio::test]
async fn paging_list_tiles_fifty_rooms_in_two_pages() {
    let (mut sync, transport) = engine();
    sync.add_list(RoomList::paging("all_rooms", 25));

    transport.queue_ok(&echo_response("tok_1", "all_rooms", 50, (0, 24)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();

    transport.queue_ok(&echo_response("tok_2", "all_rooms", 50, (25, 49)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();

    let requests = transport.sent_requests();
    assert_eq!(sent_ranges(&requests[0], "all_rooms"), json!([[0, 24]]));
    assert_eq!(sent_ranges(&requests[1], "all_rooms"), json!([[25, 49]]));

    // Page three: nothing left to request.
    let list = sync.list("all_rooms").unwrap();
    assert_eq!(list.next_range(), None);
    assert!(list.is_fully_loaded());

    transport.queue_ok(&json!({"pos": "tok_3"}));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    let third = transport.sent_requests().pop().unwrap();
    assert_eq!(sent_ranges(&third, "all_rooms"), json!([]));
}

#[tokio::test]
async fn growing_list_saturates_at_the_fetch_cap() {
    let (mut sync, transport) = engine();
    sync.add_list(RoomList::growing("all_rooms", 20).with_max_rooms_to_fetch(40));

    transport.queue_ok(&echo_response("tok_1", "all_rooms", 200, (0, 19)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    assert!(!sync.list("all_rooms").unwrap().is_fully_loaded());

    transport.queue_ok(&echo_response("tok_2", "all_rooms", 200, (0, 39)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    assert!(sync.list("all_rooms").unwrap().is_fully_loaded());

    // Saturated: the third tick re-requests the capped window.
    transport.queue_ok(&echo_response("tok_3", "all_rooms", 200, (0, 39)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();

    let requests = transport.sent_requests();
    assert_eq!(sent_ranges(&requests[0], "all_rooms"), json!([[0, 19]]));
    assert_eq!(sent_ranges(&requests[1], "all_rooms"), json!([[0, 39]]));
    assert_eq!(sent_ranges(&requests[2], "all_rooms"), json!([[0, 39]]));
}

#[tokio::test]
async fn timeout_switches_from_catch_up_to_long_poll() {
    let (mut sync, transport) = engine();
    sync.add_list(RoomList::growing("all_rooms", 10));

    // Before any response: catch-up.
    assert_eq!(sync.build_request(None).timeout, Some(2000));

    transport.queue_ok(&echo_response("tok_1", "all_rooms", 20, (0, 9)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    assert_eq!(sync.build_request(None).timeout, Some(2000));

    transport.queue_ok(&echo_response("tok_2", "all_rooms", 20, (0, 19)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    assert_eq!(sync.build_request(None).timeout, Some(30000));

    // The wire query agrees with the body.
    transport.queue_ok(&json!({"pos": "tok_3"}));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    let request = transport.last_request().unwrap();
    assert!(request
        .query
        .contains(&("timeout".to_string(), "30000".to_string())));
}

#[tokio::test]
async fn extension_only_room_surfaces_as_joined() {
    let (mut sync, transport) = engine();
    transport.queue_ok(&json!({
        "pos": "tok_1",
        "rooms": {},
        "extensions": {"typing": {"rooms": {"!a:x": {"user_ids": ["@u:x"]}}}},
    }));

    let update = sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    let room = &update.rooms.joined["!a:x"];
    assert_eq!(room.typing_user_ids, vec!["@u:x".to_string()]);
    assert!(room.timeline.is_empty());
    assert!(room.state.is_empty());
}

#[tokio::test]
async fn persistence_roundtrip_resumes_a_growing_list() {
    // Session one: two ticks reach [0, 19] of 50 rooms.
    let (mut first, transport) = engine();
    first.add_list(RoomList::growing("all_rooms", 10));
    first.enable_extension(EXT_TO_DEVICE);
    transport.queue_ok(&json!({
        "pos": "tok_1",
        "lists": {"all_rooms": {"count": 50, "ops": [{"op": "SYNC", "range": [0, 9]}]}},
        "extensions": {"to_device": {"next_batch": "td_1"}},
    }));
    transport.queue_ok(&json!({
        "pos": "tok_2",
        "lists": {"all_rooms": {"count": 50, "ops": [{"op": "SYNC", "range": [0, 19]}]}},
        "extensions": {"to_device": {"next_batch": "td_2"}},
    }));
    first.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    first.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();

    let saved = first.export_state().to_json().unwrap();
    drop(first);

    // Session two: restore and build the next request.
    let (mut second, _) = engine();
    second.add_list(RoomList::growing("all_rooms", 10));
    second.enable_extension(EXT_TO_DEVICE);
    second.restore_state(&SyncSnapshot::from_json(&saved).unwrap());

    let request = second.build_request(None);
    assert_eq!(request.pos.as_deref(), Some("tok_2"));
    assert_eq!(request.lists[0].1.ranges, vec![Range::new(0, 29)]);
    let body = request.to_json().unwrap();
    assert_eq!(body["extensions"]["to_device"]["since"], "td_2");
}

#[tokio::test]
async fn cursor_expiry_resets_pos_and_the_next_request_starts_fresh() {
    let (mut sync, transport) = engine();
    sync.add_list(RoomList::growing("all_rooms", 10));
    transport.queue_ok(&echo_response("old", "all_rooms", 50, (0, 9)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    assert_eq!(sync.pos(), Some("old"));

    transport.queue_response(
        400,
        r#"{"errcode": "M_UNKNOWN_POS", "error": "Unknown position"}"#,
    );
    let result = sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await;
    assert!(matches!(result, Err(ClientError::CursorExpired)));
    assert!(sync.pos().is_none());

    // Retrying immediately is correct; the request carries no pos, but the
    // list keeps its window.
    transport.queue_ok(&echo_response("fresh", "all_rooms", 50, (0, 19)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    let retry = transport.last_request().unwrap();
    assert!(!retry.query.iter().any(|(key, _)| key == "pos"));
    assert!(!retry.body.as_object().unwrap().contains_key("pos"));
}

#[tokio::test]
async fn membership_classification_over_a_full_tick() {
    let (mut sync, transport) = engine();
    sync.subscribe_to_rooms(&["!joined:x"], RoomSubscription::new(20));
    transport.queue_ok(&json!({
        "pos": "tok_1",
        "rooms": {
            "!joined:x": {
                "name": "Joined",
                "initial": true,
                "timeline": [{"type": "m.room.message", "sender": "@u:x", "content": {"body": "hi"}}],
                "unread_notifications": {"highlight_count": 1, "notification_count": 3},
            },
            "!invited:x": {"invite_state": [
                {"type": "m.room.member", "sender": "@i:x", "state_key": USER,
                 "content": {"membership": "invite"}},
            ]},
            "!left:x": {"required_state": [
                {"type": "m.room.member", "sender": USER, "state_key": USER,
                 "content": {"membership": "leave"}},
            ]},
        },
    }));

    let update = sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    assert_eq!(update.rooms.joined.len(), 1);
    assert_eq!(update.rooms.invited.len(), 1);
    assert_eq!(update.rooms.left.len(), 1);
    assert_eq!(update.rooms.joined["!joined:x"].notification_count, 3);

    // The subscription went out on the wire.
    let request = transport.last_request().unwrap();
    assert_eq!(request.body["room_subscriptions"]["!joined:x"]["timeline_limit"], 20);
}

#[tokio::test]
async fn log_renderings_track_the_tick() {
    let (mut sync, transport) = engine();
    sync.add_list(RoomList::growing("all_rooms", 10));
    sync.enable_all_extensions();

    let request = sync.build_request(None);
    let request_log = sync.format_request_log(&request);
    assert!(request_log.starts_with(">>> REQUEST pos=null"));
    assert!(request_log.contains("conn_id=main"));
    assert!(request_log.contains("list:all_rooms=[0, 9]"));
    assert!(request_log.contains("extensions=[e2ee, to_device, account_data, typing, receipts]"));

    transport.queue_ok(&echo_response("tok_1", "all_rooms", 10, (0, 9)));
    let update = sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();

    let response = mx_sync_types::SyncResponse::from_json(
        &echo_response("tok_1", "all_rooms", 10, (0, 9)).to_string(),
    )
    .unwrap();
    let response_log = sync.format_response_log(&response, &update);
    assert!(response_log.starts_with("<<< RESPONSE pos=tok_1"));
    assert!(response_log.contains("list:all_rooms count=10 range=[0, 9]"));
    assert!(response_log.contains("all_rooms:fully_loaded"));
    assert!(response_log.ends_with("[FULLY SYNCED]"));
    assert_eq!(
        sync.list("all_rooms").unwrap().loading_state(),
        LoadingState::FullyLoaded
    );
}

#[tokio::test]
async fn overrides_apply_per_call_only() {
    let (mut sync, transport) = engine();
    sync.add_list(RoomList::growing("all_rooms", 10));

    let overrides = RequestOverrides {
        catch_up_timeout: Some(std::time::Duration::from_millis(250)),
        ..RequestOverrides::default()
    };
    transport.queue_ok(&echo_response("tok_1", "all_rooms", 50, (0, 9)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), Some(&overrides))
        .await
        .unwrap();
    let request = transport.last_request().unwrap();
    assert!(request
        .query
        .contains(&("timeout".to_string(), "250".to_string())));

    // Without overrides the baseline returns.
    transport.queue_ok(&echo_response("tok_2", "all_rooms", 50, (0, 19)));
    sync.sync_once(HOMESERVER, TOKEN, Some(USER), None).await.unwrap();
    let request = transport.last_request().unwrap();
    assert!(request
        .query
        .contains(&("timeout".to_string(), "2000".to_string())));
}
