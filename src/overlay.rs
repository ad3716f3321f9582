//! Per-chart overlay entries.
//!
//! An [`OverlayEntry`] is a chart's rendered copy of one trend cursor. Its
//! `children` are produced by an [`OverlaySynthesizer`] and are opaque to the
//! sync engine: they are carried through updates untouched and only ever
//! constructed for new entries.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cursor::{CursorId, CursorRecord};
use crate::geom::ChartGeometry;
use crate::store::GroupSnapshot;

/// Builds renderer-owned sub-elements for newly created overlay entries.
pub trait OverlaySynthesizer {
    /// Opaque payload stored on each entry.
    type Children;

    /// Build the sub-elements (line, handle, header, labels) for a cursor.
    fn synthesize_children(
        &self,
        id: &CursorId,
        record: &CursorRecord,
        geometry: &ChartGeometry,
    ) -> Self::Children;
}

/// One rendered trend cursor on one chart.
#[derive(Debug)]
pub struct OverlayEntry<C> {
    /// Cursor this entry represents.
    pub id: CursorId,
    /// Timestamp currently rendered, epoch milliseconds.
    pub timestamp_ms: f64,
    /// Renderer sub-elements; `None` marks an entry that must be rebuilt.
    pub children: Option<Arc<C>>,
}

impl<C> OverlayEntry<C> {
    /// Create an entry with rendered children.
    pub fn new(id: CursorId, timestamp_ms: f64, children: C) -> Self {
        Self {
            id,
            timestamp_ms,
            children: Some(Arc::new(children)),
        }
    }

    /// Create an entry whose children have not been built.
    pub fn without_children(id: CursorId, timestamp_ms: f64) -> Self {
        Self {
            id,
            timestamp_ms,
            children: None,
        }
    }

    /// Copy of this entry at a different timestamp, sharing its children.
    pub fn moved_to(&self, timestamp_ms: f64) -> Self {
        Self {
            id: self.id.clone(),
            timestamp_ms,
            children: self.children.clone(),
        }
    }
}

impl<C> Clone for OverlayEntry<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            timestamp_ms: self.timestamp_ms,
            children: self.children.clone(),
        }
    }
}

/// Ordered overlay entries rendered by a chart.
///
/// Entries are reference counted so unchanged entries keep their identity
/// across reconciliations.
pub type OverlayList<C> = Vec<Arc<OverlayEntry<C>>>;

/// Ids of all entries in an overlay list.
pub fn overlay_ids<C>(overlays: &[Arc<OverlayEntry<C>>]) -> BTreeSet<CursorId> {
    overlays.iter().map(|entry| entry.id.clone()).collect()
}

/// Check that an overlay list mirrors a group snapshot exactly.
///
/// Holds when ids match one to one with no duplicates and every timestamp
/// equals the record's. Records with unusable timestamps are ignored.
pub fn mirrors_snapshot<C>(overlays: &[Arc<OverlayEntry<C>>], snapshot: &GroupSnapshot) -> bool {
    let expected = snapshot
        .cursors()
        .iter()
        .filter(|(_, record)| record.is_well_formed())
        .count();
    if overlays.len() != expected || overlay_ids(overlays).len() != expected {
        return false;
    }
    overlays.iter().all(|entry| {
        snapshot.get(&entry.id).is_some_and(|record| {
            record.is_well_formed() && record.timestamp_ms == entry.timestamp_ms
        })
    })
}

/// Check whether two lists carry the same ids, order and timestamps.
pub(crate) fn same_structure<C>(a: &[Arc<OverlayEntry<C>>], b: &[Arc<OverlayEntry<C>>]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(left, right)| {
            Arc::ptr_eq(left, right)
                || (left.id == right.id
                    && left.timestamp_ms == right.timestamp_ms
                    && left.children.is_some() == right.children.is_some())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moved_entry_shares_children() {
        let entry = OverlayEntry::new(CursorId::new("tc-1"), 1.0, vec![1_u8, 2, 3]);
        let moved = entry.moved_to(2.0);
        assert_eq!(moved.timestamp_ms, 2.0);
        assert!(Arc::ptr_eq(
            entry.children.as_ref().expect("children"),
            moved.children.as_ref().expect("children")
        ));
    }

    #[test]
    fn mirrors_snapshot_detects_duplicates() {
        let snapshot =
            GroupSnapshot::from_records([(CursorId::new("tc-1"), CursorRecord::new(5.0, 0))]);
        let entry = Arc::new(OverlayEntry::new(CursorId::new("tc-1"), 5.0, ()));
        assert!(mirrors_snapshot(&[Arc::clone(&entry)], &snapshot));
        assert!(!mirrors_snapshot(&[Arc::clone(&entry), entry], &snapshot));
    }
}
