//! Interaction helpers for placing and dragging trend cursors.
//!
//! These helpers are used by render backends to implement consistent
//! interaction semantics across platforms.

use std::sync::Arc;

use crate::cursor::CursorId;
use crate::geom::ChartGeometry;
use crate::overlay::OverlayEntry;
use crate::transform::Transform;
use crate::view::TimeViewport;

/// In-progress drag of a cursor line.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorDrag {
    /// Cursor being dragged.
    pub id: CursorId,
    /// Pointer X at drag start.
    pub start_x: f32,
    /// Whether the pointer moved past the drag threshold.
    pub active: bool,
}

impl CursorDrag {
    /// Start tracking a potential drag.
    pub fn new(id: CursorId, start_x: f32) -> Self {
        Self {
            id,
            start_x,
            active: false,
        }
    }

    /// Update with a new pointer position; returns whether the drag is active.
    pub fn update(&mut self, x: f32, threshold_px: f32) -> bool {
        if !self.active && (x - self.start_x).abs() > threshold_px {
            self.active = true;
        }
        self.active
    }
}

/// Find the cursor whose line is nearest to `offset_x`, within `tolerance_px`.
///
/// Cursors outside the viewport cannot be hit.
pub fn hit_test_cursor<C>(
    overlays: &[Arc<OverlayEntry<C>>],
    offset_x: f32,
    viewport: TimeViewport,
    geometry: &ChartGeometry,
    tolerance_px: f32,
) -> Option<CursorId> {
    let transform = Transform::new(viewport, geometry)?;
    overlays
        .iter()
        .filter(|entry| viewport.contains(entry.timestamp_ms))
        .filter_map(|entry| {
            let x = transform.timestamp_to_offset(entry.timestamp_ms)?;
            let distance = (x - offset_x).abs();
            (distance <= tolerance_px).then_some((distance, &entry.id))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id.clone())
}

/// Convert a pointer X position into a timestamp clamped to the viewport.
pub fn drag_to_timestamp(
    offset_x: f32,
    viewport: TimeViewport,
    geometry: &ChartGeometry,
) -> Option<f64> {
    let transform = Transform::new(viewport, geometry)?;
    let timestamp = transform.offset_to_timestamp(offset_x)?;
    Some(viewport.range().clamp(timestamp))
}
