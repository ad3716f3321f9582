//! Reconciliation of a chart's overlays against its group's cursors.
//!
//! Every chart in a group keeps its own overlay list. [`reconcile`] compares
//! that list with a snapshot of the group and produces the smallest new list
//! that mirrors the snapshot, or nothing at all when the chart is already in
//! sync. Existing entries keep their position; new cursors are appended in id
//! order.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::cursor::{CursorId, CursorRecord, GroupId};
use crate::geom::ChartGeometry;
use crate::overlay::{OverlayEntry, OverlayList, OverlaySynthesizer, same_structure};
use crate::store::GroupSnapshot;
use crate::view::TimeViewport;

/// Inputs of one reconciliation pass.
#[derive(Debug)]
pub struct SyncRequest<'a, C> {
    /// Overlays currently rendered by the chart.
    pub overlays: &'a [Arc<OverlayEntry<C>>],
    /// Group the chart belongs to.
    pub group: &'a GroupId,
    /// Snapshot of the group, read once for the whole pass.
    pub snapshot: &'a GroupSnapshot,
    /// Visible time range of the chart.
    pub viewport: TimeViewport,
    /// Chart size and series used to build new entries.
    pub geometry: &'a ChartGeometry,
    /// Whether the chart participates in group sync.
    pub sync_enabled: bool,
}

/// Counters describing what a reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Entries created for cursors the chart did not show.
    pub added: usize,
    /// Entries moved to a new timestamp.
    pub updated: usize,
    /// Entries dropped because their cursor is gone (or duplicated).
    pub removed: usize,
    /// Entries rebuilt because they had no children.
    pub regenerated: usize,
    /// Entries carried forward untouched.
    pub kept: usize,
    /// Records ignored because of unusable timestamps.
    pub skipped: usize,
    /// Resulting entries whose timestamp lies inside the viewport.
    pub visible: usize,
}

impl SyncStats {
    /// Check whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0 && self.regenerated == 0
    }
}

/// A new overlay list produced by [`reconcile`].
#[derive(Debug)]
pub struct Reconciliation<C> {
    /// The list the chart should render from now on.
    pub overlays: OverlayList<C>,
    /// What changed relative to the previous list.
    pub stats: SyncStats,
}

/// Reconcile a chart's overlays with its group.
///
/// Returns `None` when sync is disabled or when the current overlays already
/// mirror the snapshot. Unchanged entries are carried over by reference, and
/// moved entries reuse their children.
pub fn reconcile<S>(
    request: &SyncRequest<'_, S::Children>,
    synthesizer: &S,
) -> Option<Reconciliation<S::Children>>
where
    S: OverlaySynthesizer,
{
    if !request.sync_enabled {
        trace!(group = %request.group, "cursor sync disabled, skipping reconciliation");
        return None;
    }

    let mut stats = SyncStats::default();
    let target = well_formed_records(request.group, request.snapshot, &mut stats);

    let mut seen: HashSet<&CursorId> = HashSet::with_capacity(request.overlays.len());
    let mut next: OverlayList<S::Children> = Vec::with_capacity(target.len());

    for entry in request.overlays {
        let Some((id, record)) = target.get_key_value(&entry.id) else {
            stats.removed += 1;
            continue;
        };
        if !seen.insert(*id) {
            stats.removed += 1;
            continue;
        }
        if entry.children.is_none() {
            stats.regenerated += 1;
            next.push(Arc::new(synthesize(synthesizer, id, record, request.geometry)));
        } else if entry.timestamp_ms != record.timestamp_ms {
            stats.updated += 1;
            next.push(Arc::new(entry.moved_to(record.timestamp_ms)));
        } else {
            stats.kept += 1;
            next.push(Arc::clone(entry));
        }
    }

    for (id, record) in &target {
        if seen.contains(id) {
            continue;
        }
        stats.added += 1;
        next.push(Arc::new(synthesize(synthesizer, id, record, request.geometry)));
    }

    if same_structure(&next, request.overlays) {
        trace!(group = %request.group, entries = next.len(), "trend cursors already in sync");
        return None;
    }

    stats.visible = next
        .iter()
        .filter(|entry| request.viewport.contains(entry.timestamp_ms))
        .count();
    debug!(
        group = %request.group,
        added = stats.added,
        updated = stats.updated,
        removed = stats.removed,
        regenerated = stats.regenerated,
        kept = stats.kept,
        "trend cursor overlays reconciled"
    );
    Some(Reconciliation {
        overlays: next,
        stats,
    })
}

/// Reconcile and hand the new list to `set_overlays` if anything changed.
///
/// `set_overlays` is called at most once. Returns whether it was called.
pub fn reconcile_into<S>(
    request: &SyncRequest<'_, S::Children>,
    synthesizer: &S,
    set_overlays: impl FnOnce(OverlayList<S::Children>),
) -> bool
where
    S: OverlaySynthesizer,
{
    match reconcile(request, synthesizer) {
        Some(reconciliation) => {
            set_overlays(reconciliation.overlays);
            true
        }
        None => false,
    }
}

fn well_formed_records<'a>(
    group: &GroupId,
    snapshot: &'a GroupSnapshot,
    stats: &mut SyncStats,
) -> BTreeMap<&'a CursorId, &'a CursorRecord> {
    let mut target = BTreeMap::new();
    for (id, record) in snapshot.cursors() {
        if record.is_well_formed() {
            target.insert(id, record);
        } else {
            stats.skipped += 1;
            warn!(
                %group,
                cursor = %id,
                timestamp_ms = record.timestamp_ms,
                "ignoring trend cursor with unusable timestamp"
            );
        }
    }
    target
}

fn synthesize<S>(
    synthesizer: &S,
    id: &CursorId,
    record: &CursorRecord,
    geometry: &ChartGeometry,
) -> OverlayEntry<S::Children>
where
    S: OverlaySynthesizer,
{
    let children = synthesizer.synthesize_children(id, record, geometry);
    OverlayEntry::new(id.clone(), record.timestamp_ms, children)
}
