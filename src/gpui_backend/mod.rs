//! GPUI integration for trend cursor overlays.
//!
//! This module provides a GPUI view that paints a chart's synchronized trend
//! cursors and turns mouse input into cursor placement, drags and deletes.

#![allow(clippy::collapsible_if)]

mod paint;
mod view;

pub use view::{ChartHandle, GpuiCursorView};
