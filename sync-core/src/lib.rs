//! # mx-sync-core
//!
//! Pure sliding sync logic (no I/O, instant tests).
//!
//! This crate implements the protocol algorithms without any network or
//! disk access:
//! - [`RoomList`] - the per-list windowing state machine
//! - [`classify_rooms`] - membership classification of a raw response
//! - [`SyncSnapshot`] - the resumable state envelope
//!
//! Every module here is deterministic: the same input produces the same
//! output, so the whole crate tests without mocks or async. The actual
//! HTTP conversation is driven by `mx-sync-client`, which feeds responses
//! into these types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod list;
pub mod state;

pub use classify::{
    classify_rooms, InvitedRoomUpdate, JoinedRoomUpdate, LeftRoomUpdate, RoomUpdates, SyncUpdate,
};
pub use list::{LoadingState, RoomList, WindowMode, DEFAULT_BATCH_SIZE, DEFAULT_TIMELINE_LIMIT};
pub use state::{ListSnapshot, SyncSnapshot};
