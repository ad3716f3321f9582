//! liveplot_cursor_sync keeps trend cursors consistent across linked charts.
//! Charts sharing a group show the same cursors; each chart reconciles its own
//! overlay list against the group and only re-renders when something changed.

#![forbid(unsafe_code)]

pub mod chart;
pub mod config;
pub mod cursor;
pub mod error;
pub mod geom;
pub mod interaction;
pub mod overlay;
pub mod render;
pub mod store;
pub mod style;
pub mod sync;
pub mod transform;
pub mod view;

#[cfg(feature = "gpui")]
pub mod gpui_backend;

pub use chart::ChartCursorSync;
pub use config::CursorSyncConfig;
pub use cursor::{CursorId, CursorRecord, GroupId};
pub use error::{CursorError, Result};
pub use geom::{ChartGeometry, Margins, ScreenPoint, ScreenRect, SeriesTrack};
pub use interaction::{CursorDrag, drag_to_timestamp, hit_test_cursor};
pub use overlay::{OverlayEntry, OverlayList, OverlaySynthesizer, mirrors_snapshot, overlay_ids};
pub use render::{
    Color, CursorMarker, LineSegment, LineStyle, MarkerStyle, MarkerSynthesizer, RectStyle,
    RenderCommand, RenderList, SeriesValues, TextStyle, TimestampFormatter, build_overlay_commands,
};
pub use store::{GroupSnapshot, Subscription, TrendCursorStore};
pub use style::{CURSOR_PALETTE, Theme};
pub use sync::{Reconciliation, SyncRequest, SyncStats, reconcile, reconcile_into};
pub use transform::{Transform, offset_to_timestamp, timestamp_to_offset};
pub use view::{Range, TimeViewport};
