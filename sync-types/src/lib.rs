//! # mx-sync-types
//!
//! Wire format types for the MSC4186 simplified sliding sync protocol.
//!
//! This crate provides the JSON shapes exchanged with the homeserver:
//! - [`Range`] - inclusive list windows
//! - [`SyncRequest`], [`ListConfig`], [`RoomSubscription`],
//!   [`ExtensionConfig`] - the request body
//! - [`SyncResponse`] and its per-list, per-room, and extension payloads
//! - [`RoomEvent`], [`StrippedStateEvent`] - typed event records
//!
//! No protocol logic lives here; windowing and classification are in
//! `mx-sync-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod events;
mod range;
mod request;
mod response;

pub use events::{RoomEvent, StrippedStateEvent};
pub use range::Range;
pub use request::{
    ExtensionConfig, ListConfig, ListFilters, Presence, RoomSubscription, SyncRequest,
    ALL_EXTENSIONS, EXT_ACCOUNT_DATA, EXT_E2EE, EXT_RECEIPTS, EXT_TO_DEVICE, EXT_TYPING,
};
pub use response::{
    AccountDataUpdate, DeviceLists, E2eeUpdate, ErrorBody, ListUpdate, ReceiptsUpdate,
    ResponseExtensions, RoomData, SyncOp, SyncResponse, ToDeviceUpdate, TypingNotice,
    TypingUpdate, UnreadNotifications,
};
