//! Windowed room lists.
//!
//! A [`RoomList`] is the client-side view of one server-filtered room set.
//! Its window advances according to a [`WindowMode`]:
//!
//! - **selective**: a fixed window that never moves,
//! - **paging**: disjoint batches tiling the index space front to back,
//! - **growing**: one window anchored at zero that extends by a batch per
//!   tick.
//!
//! The list is a pure state machine: [`RoomList::next_range`] reads state,
//! [`RoomList::handle_response`] and [`RoomList::restore`] are the only
//! mutations, and nothing here performs I/O.

use crate::state::ListSnapshot;
use mx_sync_types::{ListConfig, ListFilters, ListUpdate, Range};
use std::fmt;

/// Window size used when a list is created without explicit ranges.
pub const DEFAULT_BATCH_SIZE: u64 = 20;

/// Timeline events requested per room unless configured otherwise.
pub const DEFAULT_TIMELINE_LIMIT: u32 = 10;

/// How a list's window advances across ticks.
///
/// The variant owns the data its arithmetic needs; only paging tracks an
/// offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowMode {
    /// Fixed window, chosen at construction time.
    Selective,
    /// Tile the index space in disjoint batches.
    Paging {
        /// First index not yet requested.
        page_offset: u64,
    },
    /// Extend a single window anchored at index zero.
    Growing,
}

/// How much of the list's intended coverage has been synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    /// No response observed yet.
    NotLoaded,
    /// Restored from a cached snapshot ahead of any live response.
    Preloaded,
    /// Some responses observed, coverage incomplete.
    PartiallyLoaded,
    /// The window can grow no further under the mode and caps.
    FullyLoaded,
}

impl LoadingState {
    /// Stable lowercase label, used by the log formatters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotLoaded => "not_loaded",
            Self::Preloaded => "preloaded",
            Self::PartiallyLoaded => "partially_loaded",
            Self::FullyLoaded => "fully_loaded",
        }
    }
}

impl fmt::Display for LoadingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A windowed view of one filtered room set.
#[derive(Debug, Clone)]
pub struct RoomList {
    name: String,
    mode: WindowMode,
    batch_size: u64,
    max_rooms_to_fetch: Option<u64>,
    timeline_limit: u32,
    required_state: Vec<(String, String)>,
    filters: Option<ListFilters>,
    ranges: Vec<Range>,
    server_room_count: Option<u64>,
    loading_state: LoadingState,
}

impl RoomList {
    fn with_mode(name: &str, mode: WindowMode, batch_size: u64, ranges: Vec<Range>) -> Self {
        Self {
            name: name.to_string(),
            mode,
            batch_size: batch_size.max(1),
            max_rooms_to_fetch: None,
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
            required_state: Vec::new(),
            filters: None,
            ranges,
            server_room_count: None,
            loading_state: LoadingState::NotLoaded,
        }
    }

    /// Create a growing list. The window starts empty and extends by
    /// `batch_size` rooms per tick.
    pub fn growing(name: &str, batch_size: u64) -> Self {
        Self::with_mode(name, WindowMode::Growing, batch_size, Vec::new())
    }

    /// Create a paging list. Batches of `batch_size` rooms are requested
    /// front to back until the index space is exhausted.
    pub fn paging(name: &str, batch_size: u64) -> Self {
        Self::with_mode(name, WindowMode::Paging { page_offset: 0 }, batch_size, Vec::new())
    }

    /// Create a selective list over the given fixed ranges. With no ranges
    /// supplied the list covers `[0, DEFAULT_BATCH_SIZE - 1]`.
    pub fn selective(name: &str, ranges: Vec<Range>) -> Self {
        let ranges = if ranges.is_empty() {
            vec![Range::new(0, DEFAULT_BATCH_SIZE - 1)]
        } else {
            ranges
        };
        Self::with_mode(name, WindowMode::Selective, DEFAULT_BATCH_SIZE, ranges)
    }

    /// Cap the number of rooms this list will ever fetch.
    pub fn with_max_rooms_to_fetch(mut self, cap: u64) -> Self {
        self.max_rooms_to_fetch = Some(cap);
        self
    }

    /// Set the per-room timeline limit sent with this list.
    pub fn with_timeline_limit(mut self, limit: u32) -> Self {
        self.timeline_limit = limit;
        self
    }

    /// Set the `(event type, state key)` pairs requested as required state.
    pub fn with_required_state(mut self, required_state: Vec<(String, String)>) -> Self {
        self.required_state = required_state;
        self
    }

    /// Attach a server-side filter.
    pub fn with_filters(mut self, filters: ListFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// The list's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The windowing mode.
    pub fn mode(&self) -> &WindowMode {
        &self.mode
    }

    /// The currently-synced ranges.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// The server-reported total for this list's filter, once known.
    pub fn server_room_count(&self) -> Option<u64> {
        self.server_room_count
    }

    /// Current loading state.
    pub fn loading_state(&self) -> LoadingState {
        self.loading_state
    }

    /// True once the window can grow no further.
    pub fn is_fully_loaded(&self) -> bool {
        self.loading_state == LoadingState::FullyLoaded
    }

    /// Clamp a window end against the known total and the fetch cap.
    ///
    /// Returns `None` when either bound forbids any window at all.
    fn clamp_end(&self, end: u64) -> Option<u64> {
        let mut end = end;
        if let Some(total) = self.server_room_count {
            if total == 0 {
                return None;
            }
            end = end.min(total - 1);
        }
        if let Some(cap) = self.max_rooms_to_fetch {
            if cap == 0 {
                return None;
            }
            end = end.min(cap - 1);
        }
        Some(end)
    }

    /// The window to request on the next tick, or `None` when there is
    /// nothing left to request.
    pub fn next_range(&self) -> Option<Range> {
        match self.mode {
            WindowMode::Selective => self.ranges.first().copied(),
            WindowMode::Paging { page_offset } => {
                let exhausted = self.server_room_count.is_some_and(|t| page_offset >= t)
                    || self.max_rooms_to_fetch.is_some_and(|c| page_offset >= c);
                if exhausted {
                    return None;
                }
                let end = self.clamp_end(page_offset + self.batch_size - 1)?;
                Some(Range::new(page_offset, end))
            }
            WindowMode::Growing => {
                let current_end = self.ranges.first().map(|r| r.end);
                let target = current_end.map_or(self.batch_size - 1, |e| e + self.batch_size);
                match (self.clamp_end(target), current_end) {
                    // Saturated: re-request the current window so the
                    // server keeps streaming updates for it.
                    (Some(new_end), Some(current)) if new_end <= current => {
                        Some(Range::new(0, current))
                    }
                    (Some(new_end), _) => Some(Range::new(0, new_end)),
                    (None, Some(current)) => Some(Range::new(0, current)),
                    (None, None) => None,
                }
            }
        }
    }

    /// Consume the server's per-list response: record the total, adopt the
    /// echoed window, and recompute the loading state.
    pub fn handle_response(&mut self, update: &ListUpdate) {
        self.server_room_count = Some(update.count);
        for op in &update.ops {
            if let Some(range) = op.range {
                self.ranges = vec![range];
                if let WindowMode::Paging { page_offset } = &mut self.mode {
                    *page_offset = range.end + 1;
                }
            }
        }
        self.recompute_loading_state();
    }

    /// The wire configuration for this list on the next request.
    pub fn request_config(&self) -> ListConfig {
        ListConfig {
            ranges: self.next_range().into_iter().collect(),
            timeline_limit: self.timeline_limit,
            required_state: self.required_state.clone(),
            filters: self.filters.clone(),
        }
    }

    /// The resumable subset of this list's state.
    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            range: self.ranges.first().copied(),
            server_room_count: self.server_room_count,
        }
    }

    /// Restore the resumable subset and recompute the loading state.
    pub fn restore(&mut self, snapshot: &ListSnapshot) {
        if let Some(range) = snapshot.range {
            self.ranges = vec![range];
            if let WindowMode::Paging { page_offset } = &mut self.mode {
                *page_offset = range.end + 1;
            }
        }
        self.server_room_count = snapshot.server_room_count;
        self.recompute_loading_state();
    }

    fn recompute_loading_state(&mut self) {
        let total = self.server_room_count;
        let cap = self.max_rooms_to_fetch;
        self.loading_state = match self.mode {
            WindowMode::Selective => LoadingState::FullyLoaded,
            // An empty room set never finishes catching up; the engine
            // keeps polling it on the short timeout.
            WindowMode::Paging { .. } | WindowMode::Growing if total == Some(0) => {
                LoadingState::PartiallyLoaded
            }
            WindowMode::Paging { page_offset } => {
                let done = total.is_some_and(|t| page_offset >= t)
                    || cap.is_some_and(|c| page_offset >= c);
                if done {
                    LoadingState::FullyLoaded
                } else {
                    LoadingState::PartiallyLoaded
                }
            }
            WindowMode::Growing => match self.ranges.first() {
                Some(range)
                    if total.is_some_and(|t| range.end + 1 >= t)
                        || cap.is_some_and(|c| range.end + 1 >= c) =>
                {
                    LoadingState::FullyLoaded
                }
                _ => LoadingState::PartiallyLoaded,
            },
        };
    }
}
