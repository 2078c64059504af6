//! The sliding sync engine.
//!
//! [`SlidingSync`] owns the cursor, the windowed lists, the room
//! subscriptions, and the extension registry, and drives one long-poll
//! conversation with the homeserver. A tick is [`SlidingSync::sync_once`]:
//! build the request, send it, feed the response through the lists and the
//! classifier, and hand the caller a [`SyncUpdate`].
//!
//! The engine is single-threaded by contract: every mutating operation
//! takes `&mut self` and the only suspension point is the transport call.
//! State advances only after a response has fully parsed, so an aborted
//! tick leaves the engine exactly where it was.

use crate::logfmt;
use crate::transport::{Transport, TransportError, TransportRequest};
use mx_sync_core::{classify_rooms, LoadingState, RoomList, SyncSnapshot, SyncUpdate};
use mx_sync_types::{
    ErrorBody, ExtensionConfig, Presence, RoomSubscription, SyncRequest, SyncResponse,
    ALL_EXTENSIONS, EXT_TO_DEVICE,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Unstable endpoint path for MSC4186 simplified sliding sync.
pub const SYNC_ENDPOINT: &str = "/_matrix/client/unstable/org.matrix.msc4186/sync";

/// Error code the server returns when the cursor is no longer valid.
const ERRCODE_UNKNOWN_POS: &str = "M_UNKNOWN_POS";

/// Errors surfaced by [`SlidingSync::sync_once`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server no longer recognizes our cursor. The engine has already
    /// cleared `pos`, so retrying immediately is correct.
    #[error("sync cursor expired; position has been reset")]
    CursorExpired,

    /// The request failed in transit or the server answered non-200.
    #[error("transport failure (status {status:?}): {body}")]
    TransportFailure {
        /// HTTP status, when a response was received at all.
        status: Option<u16>,
        /// Response body or transport error text.
        body: String,
    },

    /// A 200 response did not match the minimum wire contract. The tick is
    /// lost; engine state has not advanced.
    #[error("malformed sync response: {0}")]
    Malformed(String),

    /// The request body could not be serialized.
    #[error("request serialization failed: {0}")]
    Serialization(String),
}

impl From<TransportError> for ClientError {
    fn from(error: TransportError) -> Self {
        Self::TransportFailure {
            status: None,
            body: error.to_string(),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct SlidingSyncConfig {
    /// Connection identifier echoed on every request.
    pub conn_id: String,
    /// Request timeout while lists are still catching up.
    pub catch_up_timeout: Duration,
    /// Request timeout once every list is fully loaded.
    pub long_poll_timeout: Duration,
}

impl SlidingSyncConfig {
    /// Create a configuration with the default timeout pair
    /// (2 s catch-up, 30 s long-poll).
    pub fn new(conn_id: &str) -> Self {
        Self {
            conn_id: conn_id.to_string(),
            catch_up_timeout: Duration::from_millis(2000),
            long_poll_timeout: Duration::from_millis(30000),
        }
    }

    /// Set the catch-up timeout.
    pub fn with_catch_up_timeout(mut self, timeout: Duration) -> Self {
        self.catch_up_timeout = timeout;
        self
    }

    /// Set the long-poll timeout.
    pub fn with_long_poll_timeout(mut self, timeout: Duration) -> Self {
        self.long_poll_timeout = timeout;
        self
    }
}

/// Per-call adjustments to a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    /// Replace the configured catch-up timeout for this call.
    pub catch_up_timeout: Option<Duration>,
    /// Replace the configured long-poll timeout for this call.
    pub long_poll_timeout: Option<Duration>,
    /// Presence hint, sent as a query parameter.
    pub set_presence: Option<Presence>,
}

/// The sliding sync engine.
pub struct SlidingSync<T: Transport> {
    config: SlidingSyncConfig,
    transport: T,
    lists: Vec<RoomList>,
    room_subscriptions: Vec<(String, RoomSubscription)>,
    extensions: Vec<(String, ExtensionConfig)>,
    pos: Option<String>,
    to_device_since: Option<String>,
}

impl<T: Transport> SlidingSync<T> {
    /// Create an engine over the given transport.
    pub fn new(config: SlidingSyncConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            lists: Vec::new(),
            room_subscriptions: Vec::new(),
            extensions: Vec::new(),
            pos: None,
            to_device_since: None,
        }
    }

    /// Add a list, replacing any existing list with the same name.
    pub fn add_list(&mut self, list: RoomList) {
        match self.lists.iter_mut().find(|l| l.name() == list.name()) {
            Some(existing) => *existing = list,
            None => self.lists.push(list),
        }
    }

    /// Look up a list by name.
    pub fn list(&self, name: &str) -> Option<&RoomList> {
        self.lists.iter().find(|l| l.name() == name)
    }

    /// All lists, in insertion order.
    pub fn lists(&self) -> impl Iterator<Item = &RoomList> {
        self.lists.iter()
    }

    /// Subscribe the given rooms with the given configuration, replacing
    /// any existing subscription per room.
    pub fn subscribe_to_rooms(&mut self, room_ids: &[&str], subscription: RoomSubscription) {
        for room_id in room_ids {
            match self
                .room_subscriptions
                .iter_mut()
                .find(|(id, _)| id == room_id)
            {
                Some(entry) => entry.1 = subscription.clone(),
                None => self
                    .room_subscriptions
                    .push((room_id.to_string(), subscription.clone())),
            }
        }
    }

    /// Drop subscriptions for the given rooms. Unknown ids are ignored.
    pub fn unsubscribe_from_rooms(&mut self, room_ids: &[&str]) {
        self.room_subscriptions
            .retain(|(id, _)| !room_ids.contains(&id.as_str()));
    }

    /// Enable one extension by name. The to-device entry snapshots the
    /// current since-token; the snapshot is refreshed again on every
    /// request build.
    pub fn enable_extension(&mut self, name: &str) {
        let config = if name == EXT_TO_DEVICE {
            ExtensionConfig::ToDevice {
                enabled: true,
                since: self.to_device_since.clone(),
            }
        } else {
            ExtensionConfig::Generic { enabled: true }
        };
        match self.extensions.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = config,
            None => self.extensions.push((name.to_string(), config)),
        }
    }

    /// Enable the full extension set: e2ee, to-device, account data,
    /// typing, and receipts.
    pub fn enable_all_extensions(&mut self) {
        for name in ALL_EXTENSIONS {
            self.enable_extension(name);
        }
    }

    /// The current cursor, if any tick has succeeded.
    pub fn pos(&self) -> Option<&str> {
        self.pos.as_deref()
    }

    /// The current to-device since-token.
    pub fn to_device_since(&self) -> Option<&str> {
        self.to_device_since.as_deref()
    }

    /// True iff there is at least one list and every list is fully loaded.
    pub fn is_fully_synced(&self) -> bool {
        !self.lists.is_empty() && self.lists.iter().all(RoomList::is_fully_loaded)
    }

    /// The timeout the next request will carry: long-poll once fully
    /// synced, catch-up otherwise. Overrides replace the respective
    /// baseline.
    pub fn effective_timeout(&self, overrides: Option<&RequestOverrides>) -> Duration {
        let catch_up = overrides
            .and_then(|o| o.catch_up_timeout)
            .unwrap_or(self.config.catch_up_timeout);
        let long_poll = overrides
            .and_then(|o| o.long_poll_timeout)
            .unwrap_or(self.config.long_poll_timeout);
        if self.is_fully_synced() {
            long_poll
        } else {
            catch_up
        }
    }

    /// Assemble the next request from the current engine state.
    ///
    /// This is the single authoritative window computation per tick: each
    /// list's `next_range` is evaluated here and nowhere else, so the wire
    /// and the engine cannot disagree.
    pub fn build_request(&self, overrides: Option<&RequestOverrides>) -> SyncRequest {
        let timeout = self.effective_timeout(overrides);
        let extensions = self
            .extensions
            .iter()
            .map(|(name, config)| {
                // The stored to-device config is a projection; the token
                // lives on the engine and may have advanced since enable.
                let config = if name == EXT_TO_DEVICE {
                    match config {
                        ExtensionConfig::ToDevice { enabled, .. } => ExtensionConfig::ToDevice {
                            enabled: *enabled,
                            since: self.to_device_since.clone(),
                        },
                        other => other.clone(),
                    }
                } else {
                    config.clone()
                };
                (name.clone(), config)
            })
            .collect();

        SyncRequest {
            conn_id: self.config.conn_id.clone(),
            pos: self.pos.clone(),
            timeout: Some(timeout.as_millis() as u64),
            lists: self
                .lists
                .iter()
                .map(|list| (list.name().to_string(), list.request_config()))
                .collect(),
            room_subscriptions: self.room_subscriptions.clone(),
            extensions,
            set_presence: overrides.and_then(|o| o.set_presence),
        }
    }

    /// Apply one parsed response: advance the cursor, feed known lists,
    /// pick up the to-device token, and classify rooms.
    ///
    /// List names in the response that the engine does not know are
    /// ignored and do not appear in `updated_lists`.
    pub fn handle_response(&mut self, response: &SyncResponse, user_id: Option<&str>) -> SyncUpdate {
        self.pos = Some(response.pos.clone());

        let mut updated_lists = Vec::new();
        for (name, list_update) in &response.lists {
            if let Some(list) = self.lists.iter_mut().find(|l| l.name() == name) {
                list.handle_response(list_update);
                updated_lists.push(name.clone());
            }
        }

        if let Some(to_device) = &response.extensions.to_device {
            if let Some(next_batch) = &to_device.next_batch {
                self.to_device_since = Some(next_batch.clone());
            }
        }

        SyncUpdate {
            pos: response.pos.clone(),
            updated_lists,
            rooms: classify_rooms(response, user_id),
            extensions: response.extensions.clone(),
        }
    }

    /// Run one sync tick against the given homeserver.
    ///
    /// On `M_UNKNOWN_POS` the cursor is cleared before the error is
    /// returned, so the caller may loop immediately and the next request
    /// starts from scratch. Any other failure leaves state untouched.
    pub async fn sync_once(
        &mut self,
        homeserver_url: &str,
        access_token: &str,
        user_id: Option<&str>,
        overrides: Option<&RequestOverrides>,
    ) -> Result<SyncUpdate, ClientError> {
        let request = self.build_request(overrides);
        debug!("{}", self.format_request_log(&request));

        let mut query = Vec::new();
        if let Some(pos) = &request.pos {
            query.push(("pos".to_string(), pos.clone()));
        }
        if let Some(timeout) = request.timeout {
            query.push(("timeout".to_string(), timeout.to_string()));
        }
        if let Some(presence) = request.set_presence {
            query.push(("set_presence".to_string(), presence.to_string()));
        }

        let body = request
            .to_json()
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        let url = format!("{}{SYNC_ENDPOINT}", homeserver_url.trim_end_matches('/'));

        let raw = self
            .transport
            .post_json(TransportRequest {
                url,
                access_token: access_token.to_string(),
                query,
                body,
            })
            .await?;

        if raw.status != 200 {
            if let Ok(error) = ErrorBody::from_json(&raw.body) {
                if error.errcode.as_deref() == Some(ERRCODE_UNKNOWN_POS) {
                    warn!("server expired our sync position; restarting from scratch");
                    self.pos = None;
                    return Err(ClientError::CursorExpired);
                }
            }
            return Err(ClientError::TransportFailure {
                status: Some(raw.status),
                body: raw.body,
            });
        }

        let response =
            SyncResponse::from_json(&raw.body).map_err(|e| ClientError::Malformed(e.to_string()))?;
        let update = self.handle_response(&response, user_id);
        debug!("{}", self.format_response_log(&response, &update));
        Ok(update)
    }

    /// Export the resumable state: cursor, to-device token, and per-list
    /// range and total. The snapshot is a plain value; persist it however
    /// you like.
    pub fn export_state(&self) -> SyncSnapshot {
        SyncSnapshot {
            pos: self.pos.clone(),
            to_device_since: self.to_device_since.clone(),
            lists: self
                .lists
                .iter()
                .map(|list| (list.name().to_string(), list.snapshot()))
                .collect(),
        }
    }

    /// Restore previously exported state. Snapshot entries for list names
    /// this engine does not have are silently dropped.
    pub fn restore_state(&mut self, snapshot: &SyncSnapshot) {
        self.pos = snapshot.pos.clone();
        self.to_device_since = snapshot.to_device_since.clone();
        for (name, list_snapshot) in &snapshot.lists {
            if let Some(list) = self.lists.iter_mut().find(|l| l.name() == name) {
                list.restore(list_snapshot);
            }
        }
    }

    /// Render the request log line for the given request.
    pub fn format_request_log(&self, request: &SyncRequest) -> String {
        logfmt::format_request(request)
    }

    /// Render the response log line for the given processed response.
    pub fn format_response_log(&self, response: &SyncResponse, update: &SyncUpdate) -> String {
        let list_states: Vec<(String, LoadingState)> = self
            .lists
            .iter()
            .map(|list| (list.name().to_string(), list.loading_state()))
            .collect();
        logfmt::format_response(response, update, &list_states, self.is_fully_synced())
    }

    /// Access the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
