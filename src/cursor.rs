//! Trend cursor identities and records.

use std::fmt;
use std::sync::Arc;

/// Identifier of a synchronization group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(Arc<str>);

impl GroupId {
    /// Create a group identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Access the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a trend cursor, unique within its group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorId(Arc<str>);

impl CursorId {
    /// Create a cursor identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Identifier assigned to the n-th cursor created by a store.
    pub(crate) fn generated(n: u64) -> Self {
        Self::new(format!("trendCursor-{n}"))
    }

    /// Access the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CursorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Authoritative state of one trend cursor.
///
/// Only the timestamp changes over the lifetime of a cursor; the color index
/// is fixed when the cursor is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorRecord {
    /// Marked instant, epoch milliseconds.
    pub timestamp_ms: f64,
    /// Index into the cursor palette.
    pub color_index: usize,
}

impl CursorRecord {
    /// Create a cursor record.
    pub fn new(timestamp_ms: f64, color_index: usize) -> Self {
        Self {
            timestamp_ms,
            color_index,
        }
    }

    /// Check whether the record can be reconciled onto a chart.
    pub fn is_well_formed(&self) -> bool {
        is_valid_timestamp(self.timestamp_ms)
    }
}

/// Check whether a timestamp is usable as a cursor position.
pub fn is_valid_timestamp(timestamp_ms: f64) -> bool {
    timestamp_ms.is_finite()
}

/// Pick the lowest palette index not used by any of the given records.
pub fn next_color_index<'a>(
    records: impl IntoIterator<Item = &'a CursorRecord>,
    palette_len: usize,
) -> usize {
    let palette_len = palette_len.max(1);
    let mut used = vec![false; palette_len];
    for record in records {
        if let Some(slot) = used.get_mut(record.color_index) {
            *slot = true;
        }
    }
    used.iter().position(|taken| !taken).unwrap_or(0)
}
