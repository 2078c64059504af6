//! # mx-sync-client
//!
//! Client engine for MSC4186 simplified sliding sync.
//!
//! This is the crate applications drive. It owns the sync cursor, the
//! windowed lists, and the extension registry, and runs the long-poll
//! conversation over a pluggable [`Transport`].
//!
//! ## Architecture
//!
//! ```text
//! Application → SlidingSync → Transport → Homeserver
//!                    ↓
//!            mx-sync-core (pure windowing + classification)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use mx_sync_client::{HttpTransport, SlidingSync, SlidingSyncConfig};
//! use mx_sync_core::RoomList;
//!
//! let mut sync = SlidingSync::new(SlidingSyncConfig::new("main"), HttpTransport::new());
//! sync.add_list(RoomList::growing("all_rooms", 20));
//! sync.enable_all_extensions();
//!
//! loop {
//!     let update = sync
//!         .sync_once("https://hs.example", &token, Some("@me:hs.example"), None)
//!         .await?;
//!     // hand update.rooms and update.extensions to the app
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod logfmt;
pub mod transport;

pub use client::{
    ClientError, RequestOverrides, SlidingSync, SlidingSyncConfig, SYNC_ENDPOINT,
};
pub use transport::{
    HttpTransport, MockTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
