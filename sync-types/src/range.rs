//! Window range type for sliding sync lists.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An inclusive window `[start, end]` into the server's filtered room list.
///
/// Ranges are index pairs, not room counts: `[0, 9]` covers the first ten
/// rooms. On the wire a range is a two-element array, matching the MSC4186
/// `ranges` field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// First covered index.
    pub start: u64,
    /// Last covered index (inclusive).
    pub end: u64,
}

impl Range {
    /// Create a new range. `start` must not exceed `end`.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start must not exceed end");
        Self { start, end }
    }

    /// Number of indices covered by this range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false: a range covers at least one index.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Range{self}")
    }
}

impl Serialize for Range {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.start, self.end).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(u64, u64)>::deserialize(deserializer)?;
        if start > end {
            return Err(D::Error::custom(format!(
                "invalid range: start {start} exceeds end {end}"
            )));
        }
        Ok(Self { start, end })
    }
}
