//! Per-chart driver for trend cursor synchronization.
//!
//! [`ChartCursorSync`] owns one chart's overlay list and re-runs
//! reconciliation whenever one of its inputs changes: the group state (via a
//! store subscription), the viewport, the geometry, or the sync flag. When
//! sync is disabled the chart keeps its own private cursor set, reconciled
//! the same way against local records.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::config::CursorSyncConfig;
use crate::cursor::{CursorId, CursorRecord, GroupId, is_valid_timestamp, next_color_index};
use crate::error::{CursorError, Result};
use crate::geom::ChartGeometry;
use crate::interaction::{drag_to_timestamp, hit_test_cursor};
use crate::overlay::{OverlayEntry, OverlayList, OverlaySynthesizer};
use crate::store::{GroupSnapshot, Subscription, TrendCursorStore};
use crate::style::CURSOR_PALETTE;
use crate::sync::{SyncRequest, reconcile};
use crate::view::TimeViewport;

/// Trend cursor state of a single chart instance.
pub struct ChartCursorSync<S: OverlaySynthesizer> {
    store: TrendCursorStore,
    group: GroupId,
    synthesizer: S,
    config: CursorSyncConfig,
    sync_enabled: bool,
    viewport: TimeViewport,
    geometry: ChartGeometry,
    overlays: OverlayList<S::Children>,
    local: BTreeMap<CursorId, CursorRecord>,
    next_local: u64,
    pending: Arc<AtomicBool>,
    subscription: Option<Subscription>,
    applied_revision: Option<u64>,
}

impl<S: OverlaySynthesizer> ChartCursorSync<S> {
    /// Create a chart bound to `group`, with sync enabled.
    pub fn new(
        store: TrendCursorStore,
        group: GroupId,
        synthesizer: S,
        viewport: TimeViewport,
        geometry: ChartGeometry,
    ) -> Self {
        Self {
            store,
            group,
            synthesizer,
            config: CursorSyncConfig::default(),
            sync_enabled: true,
            viewport,
            geometry,
            overlays: Vec::new(),
            local: BTreeMap::new(),
            next_local: 0,
            pending: Arc::new(AtomicBool::new(true)),
            subscription: None,
            applied_revision: None,
        }
    }

    /// Replace the configuration.
    ///
    /// `max_cursors_per_group` only limits cursors placed while sync is
    /// disabled. Synced cursors are limited by the store's own configuration.
    pub fn with_config(mut self, config: CursorSyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Start listening to group changes.
    ///
    /// Notifications only mark the chart as pending; call [`Self::refresh`]
    /// from the host's update cycle to apply them.
    pub fn attach(&mut self) {
        self.attach_with(|| {});
    }

    /// Start listening to group changes and call `notify` on each change.
    ///
    /// `notify` typically schedules a redraw of the hosting view.
    pub fn attach_with(&mut self, notify: impl Fn() + Send + Sync + 'static) {
        let pending = Arc::clone(&self.pending);
        self.subscription = Some(self.store.subscribe(&self.group, move |_| {
            pending.store(true, Ordering::Release);
            notify();
        }));
        self.pending.store(true, Ordering::Release);
    }

    /// Stop listening to group changes.
    pub fn detach(&mut self) {
        self.subscription = None;
    }

    /// Check whether the group changed since the last refresh.
    pub fn has_pending_update(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Re-read the group and reconcile the overlays.
    ///
    /// Returns whether the overlay list changed.
    pub fn refresh(&mut self) -> bool {
        self.pending.store(false, Ordering::Release);
        let snapshot = self.store.snapshot(&self.group);
        let changed = self.reconcile_with(&snapshot, self.sync_enabled);
        if self.sync_enabled {
            self.applied_revision = Some(snapshot.revision());
        }
        changed
    }

    /// Overlays currently rendered by this chart.
    pub fn overlays(&self) -> &[Arc<OverlayEntry<S::Children>>] {
        &self.overlays
    }

    /// Group this chart belongs to.
    pub fn group(&self) -> &GroupId {
        &self.group
    }

    /// Whether this chart follows its group.
    pub fn sync_enabled(&self) -> bool {
        self.sync_enabled
    }

    /// Visible time range.
    pub fn viewport(&self) -> TimeViewport {
        self.viewport
    }

    /// Chart geometry.
    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    /// Synthesizer used for new entries.
    pub fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    /// Active configuration.
    pub fn config(&self) -> &CursorSyncConfig {
        &self.config
    }

    /// Group revision the overlays were last reconciled against.
    pub fn applied_revision(&self) -> Option<u64> {
        self.applied_revision
    }

    /// Turn group sync on or off.
    ///
    /// Turning sync on adopts the group's cursors; turning it off keeps the
    /// cursors currently shown as this chart's private set.
    pub fn set_sync_enabled(&mut self, enabled: bool) -> bool {
        if self.sync_enabled == enabled {
            return false;
        }
        self.sync_enabled = enabled;
        if enabled {
            self.refresh()
        } else {
            let snapshot = self.store.snapshot(&self.group);
            self.local = self
                .overlays
                .iter()
                .map(|entry| {
                    let color_index = snapshot.get(&entry.id).map_or(0, |r| r.color_index);
                    (entry.id.clone(), CursorRecord::new(entry.timestamp_ms, color_index))
                })
                .collect();
            self.applied_revision = None;
            false
        }
    }

    /// Change the visible time range.
    pub fn set_viewport(&mut self, viewport: TimeViewport) -> bool {
        self.viewport = viewport;
        self.refresh()
    }

    /// Change the chart geometry, rebuilding every marker.
    pub fn set_geometry(&mut self, geometry: ChartGeometry) -> bool {
        if self.geometry == geometry {
            return false;
        }
        self.geometry = geometry;
        self.overlays = self
            .overlays
            .iter()
            .map(|entry| {
                Arc::new(OverlayEntry::without_children(
                    entry.id.clone(),
                    entry.timestamp_ms,
                ))
            })
            .collect();
        if self.sync_enabled {
            self.refresh()
        } else {
            self.apply_local()
        }
    }

    /// Place a new cursor at a timestamp.
    pub fn place_cursor(&mut self, timestamp_ms: f64) -> Result<CursorId> {
        if self.sync_enabled {
            let id = self.store.add_cursor(&self.group, timestamp_ms)?;
            self.refresh();
            return Ok(id);
        }
        if !is_valid_timestamp(timestamp_ms) {
            return Err(CursorError::InvalidTimestamp(timestamp_ms));
        }
        let limit = self.config.max_cursors_per_group;
        if self.local.len() >= limit {
            return Err(CursorError::GroupFull {
                group: self.group.clone(),
                limit,
            });
        }
        self.next_local = self.next_local.wrapping_add(1);
        let id = CursorId::new(format!("localCursor-{}", self.next_local));
        let color_index = next_color_index(self.local.values(), CURSOR_PALETTE.len());
        self.local
            .insert(id.clone(), CursorRecord::new(timestamp_ms, color_index));
        debug!(group = %self.group, cursor = %id, timestamp_ms, "local trend cursor added");
        self.apply_local();
        Ok(id)
    }

    /// Place a new cursor under a pointer X position.
    pub fn place_cursor_at(&mut self, offset_x: f32) -> Result<CursorId> {
        let timestamp_ms = drag_to_timestamp(offset_x, self.viewport, &self.geometry)
            .ok_or(CursorError::InvalidViewport)?;
        self.place_cursor(timestamp_ms)
    }

    /// Move a cursor to a timestamp.
    pub fn drag_cursor(&mut self, id: &CursorId, timestamp_ms: f64) -> Result<()> {
        if self.sync_enabled {
            self.store.move_cursor(&self.group, id, timestamp_ms)?;
            self.refresh();
            return Ok(());
        }
        if !is_valid_timestamp(timestamp_ms) {
            return Err(CursorError::InvalidTimestamp(timestamp_ms));
        }
        match self.local.get_mut(id) {
            Some(record) => record.timestamp_ms = timestamp_ms,
            None => return Err(self.not_found(id)),
        }
        self.apply_local();
        Ok(())
    }

    /// Move a cursor under a pointer X position.
    pub fn drag_cursor_to(&mut self, id: &CursorId, offset_x: f32) -> Result<()> {
        let timestamp_ms = drag_to_timestamp(offset_x, self.viewport, &self.geometry)
            .ok_or(CursorError::InvalidViewport)?;
        self.drag_cursor(id, timestamp_ms)
    }

    /// Delete a cursor.
    pub fn delete_cursor(&mut self, id: &CursorId) -> Result<()> {
        if self.sync_enabled {
            self.store.remove_cursor(&self.group, id)?;
            self.refresh();
            return Ok(());
        }
        if self.local.remove(id).is_none() {
            return Err(self.not_found(id));
        }
        self.apply_local();
        Ok(())
    }

    /// Cursor whose line is under a pointer X position.
    pub fn cursor_at(&self, offset_x: f32) -> Option<CursorId> {
        hit_test_cursor(
            &self.overlays,
            offset_x,
            self.viewport,
            &self.geometry,
            self.config.handle_hit_px,
        )
    }

    fn apply_local(&mut self) -> bool {
        let snapshot =
            GroupSnapshot::from_records(self.local.iter().map(|(id, record)| (id.clone(), *record)));
        self.reconcile_with(&snapshot, true)
    }

    fn reconcile_with(&mut self, snapshot: &GroupSnapshot, sync_enabled: bool) -> bool {
        let request = SyncRequest {
            overlays: &self.overlays,
            group: &self.group,
            snapshot,
            viewport: self.viewport,
            geometry: &self.geometry,
            sync_enabled,
        };
        match reconcile(&request, &self.synthesizer) {
            Some(reconciliation) => {
                self.overlays = reconciliation.overlays;
                true
            }
            None => false,
        }
    }

    fn not_found(&self, id: &CursorId) -> CursorError {
        CursorError::CursorNotFound {
            group: self.group.clone(),
            id: id.clone(),
        }
    }
}

impl<S> std::fmt::Debug for ChartCursorSync<S>
where
    S: OverlaySynthesizer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartCursorSync")
            .field("group", &self.group)
            .field("sync_enabled", &self.sync_enabled)
            .field("viewport", &self.viewport)
            .field("overlays", &self.overlays.len())
            .field("applied_revision", &self.applied_revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MarkerSynthesizer;

    fn chart(store: &TrendCursorStore) -> ChartCursorSync<MarkerSynthesizer> {
        let mut chart = ChartCursorSync::new(
            store.clone(),
            GroupId::new("group1"),
            MarkerSynthesizer::default(),
            TimeViewport::new(0.0, 10_000.0),
            ChartGeometry::new(400.0, 300.0),
        );
        chart.attach();
        chart
    }

    #[test]
    fn notification_marks_chart_pending() {
        let store = TrendCursorStore::new();
        let mut chart = chart(&store);
        assert!(!chart.refresh());
        assert!(!chart.has_pending_update());

        store.add_cursor(chart.group(), 1_000.0).expect("add");
        assert!(chart.has_pending_update());
        assert!(chart.refresh());
        assert_eq!(chart.overlays().len(), 1);
        assert_eq!(chart.applied_revision(), Some(1));
    }

    #[test]
    fn local_cursors_ignore_group() {
        let store = TrendCursorStore::new();
        let mut chart = chart(&store);
        chart.set_sync_enabled(false);
        let id = chart.place_cursor(2_000.0).expect("place");
        assert!(store.snapshot(chart.group()).is_empty());
        assert_eq!(chart.overlays().len(), 1);

        store.add_cursor(chart.group(), 1_000.0).expect("add");
        assert!(!chart.refresh());
        assert_eq!(chart.overlays()[0].id, id);

        chart.drag_cursor(&id, 3_000.0).expect("drag");
        assert_eq!(chart.overlays()[0].timestamp_ms, 3_000.0);
        chart.delete_cursor(&id).expect("delete");
        assert!(chart.overlays().is_empty());
    }

    #[test]
    fn enabling_sync_adopts_group_state() {
        let store = TrendCursorStore::new();
        let mut chart = chart(&store);
        chart.set_sync_enabled(false);
        chart.place_cursor(2_000.0).expect("place");
        let shared = store.add_cursor(chart.group(), 1_000.0).expect("add");

        assert!(chart.set_sync_enabled(true));
        assert_eq!(chart.overlays().len(), 1);
        assert_eq!(chart.overlays()[0].id, shared);
    }

    #[test]
    fn geometry_change_rebuilds_markers() {
        let store = TrendCursorStore::new();
        let mut chart = chart(&store);
        chart.place_cursor(1_000.0).expect("place");
        let before = Arc::clone(&chart.overlays()[0]);

        assert!(chart.set_geometry(ChartGeometry::new(800.0, 300.0)));
        let after = &chart.overlays()[0];
        assert_eq!(after.id, before.id);
        assert!(!Arc::ptr_eq(
            before.children.as_ref().expect("children"),
            after.children.as_ref().expect("children"),
        ));
    }

    #[test]
    fn viewport_change_alone_is_not_a_change() {
        let store = TrendCursorStore::new();
        let mut chart = chart(&store);
        chart.place_cursor(1_000.0).expect("place");
        assert!(!chart.set_viewport(TimeViewport::new(5_000.0, 6_000.0)));
        assert_eq!(chart.overlays().len(), 1);
    }

    #[test]
    fn pointer_operations_map_through_viewport() {
        let store = TrendCursorStore::new();
        let mut chart = chart(&store);
        let plot = chart.geometry().plot_rect();
        let mid = (plot.min.x + plot.max.x) * 0.5;
        let id = chart.place_cursor_at(mid).expect("place");
        assert!((chart.overlays()[0].timestamp_ms - 5_000.0).abs() < 1e-3);
        assert_eq!(chart.cursor_at(mid + 2.0), Some(id.clone()));

        chart.drag_cursor_to(&id, plot.max.x).expect("drag");
        assert!((chart.overlays()[0].timestamp_ms - 10_000.0).abs() < 1e-3);
    }

    #[test]
    fn local_limit_is_enforced() {
        let store = TrendCursorStore::new();
        let mut chart = chart(&store).with_config(CursorSyncConfig {
            max_cursors_per_group: 1,
            ..Default::default()
        });
        chart.set_sync_enabled(false);
        chart.place_cursor(1.0).expect("place");
        assert!(matches!(
            chart.place_cursor(2.0),
            Err(CursorError::GroupFull { limit: 1, .. })
        ));
    }

    #[test]
    fn synced_limit_comes_from_store() {
        let store = TrendCursorStore::with_config(&CursorSyncConfig {
            max_cursors_per_group: 3,
            ..Default::default()
        });
        let mut chart = chart(&store).with_config(CursorSyncConfig {
            max_cursors_per_group: 1,
            ..Default::default()
        });
        chart.place_cursor(1.0).expect("place");
        chart.place_cursor(2.0).expect("place");
        chart.place_cursor(3.0).expect("place");
        assert!(matches!(
            chart.place_cursor(4.0),
            Err(CursorError::GroupFull { limit: 3, .. })
        ));
        assert_eq!(chart.overlays().len(), 3);
    }
}
