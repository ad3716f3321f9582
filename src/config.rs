//! Configuration for trend cursor synchronization.

/// Limits and interaction thresholds for trend cursors.
#[derive(Debug, Clone)]
pub struct CursorSyncConfig {
    /// Maximum number of cursors a single group may hold.
    pub max_cursors_per_group: usize,
    /// Pixel tolerance for grabbing a cursor line.
    pub handle_hit_px: f32,
    /// Pixel threshold for starting a drag.
    pub drag_threshold_px: f32,
}

impl Default for CursorSyncConfig {
    fn default() -> Self {
        Self {
            max_cursors_per_group: 5,
            handle_hit_px: 6.0,
            drag_threshold_px: 4.0,
        }
    }
}
