//! Geometric primitives and chart geometry.
//!
//! Screen-space types are expressed in logical pixels with the origin at the
//! top-left corner of the chart.

use crate::render::Color;
use crate::view::Range;

/// A point in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// X value in screen pixels.
    pub x: f32,
    /// Y value in screen pixels.
    pub y: f32,
}

impl ScreenPoint {
    /// Create a new screen point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    /// Top-left corner.
    pub min: ScreenPoint,
    /// Bottom-right corner.
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Create a new screen rectangle from corners.
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> Self {
        Self { min, max }
    }

    /// Rectangle width in pixels.
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Rectangle height in pixels.
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Check whether the rectangle has positive area.
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Check whether the point lies inside the rectangle.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Space reserved around the plot area for axes and cursor headers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    /// Left margin in pixels.
    pub left: f32,
    /// Right margin in pixels.
    pub right: f32,
    /// Top margin in pixels.
    pub top: f32,
    /// Bottom margin in pixels.
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 50.0,
            right: 50.0,
            top: 50.0,
            bottom: 50.0,
        }
    }
}

/// A series drawn on the chart, as far as cursor markers care about it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTrack {
    /// Display name.
    pub name: String,
    /// Series color, reused for the value dot on each cursor.
    pub color: Color,
}

impl SeriesTrack {
    /// Create a series track.
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Size and series metadata of one chart instance.
///
/// Used when synthesizing marker parts for newly created overlay entries and
/// when mapping timestamps onto the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    /// Full chart width in pixels.
    pub width: f32,
    /// Full chart height in pixels.
    pub height: f32,
    /// Margins around the plot area.
    pub margins: Margins,
    /// Visible value range on the Y axis.
    pub value_range: Range,
    /// Series drawn on the chart.
    pub series: Vec<SeriesTrack>,
}

impl ChartGeometry {
    /// Create geometry for a chart of the given size with default margins.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            margins: Margins::default(),
            value_range: Range::new(0.0, 1.0),
            series: Vec::new(),
        }
    }

    /// Set the margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Set the visible value range.
    pub fn with_value_range(mut self, min: f64, max: f64) -> Self {
        self.value_range = Range::new(min, max);
        self
    }

    /// Add a series track.
    pub fn with_series(mut self, series: SeriesTrack) -> Self {
        self.series.push(series);
        self
    }

    /// The plot area inside the margins.
    pub fn plot_rect(&self) -> ScreenRect {
        let min_x = self.margins.left.min(self.width);
        let min_y = self.margins.top.min(self.height);
        let max_x = (self.width - self.margins.right).max(min_x);
        let max_y = (self.height - self.margins.bottom).max(min_y);
        ScreenRect::new(ScreenPoint::new(min_x, min_y), ScreenPoint::new(max_x, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_rect_respects_margins() {
        let geometry = ChartGeometry::new(400.0, 300.0);
        let rect = geometry.plot_rect();
        assert_eq!(rect.min, ScreenPoint::new(50.0, 50.0));
        assert_eq!(rect.max, ScreenPoint::new(350.0, 250.0));
        assert!(rect.is_valid());
    }

    #[test]
    fn plot_rect_collapses_when_too_small() {
        let geometry = ChartGeometry::new(60.0, 40.0);
        let rect = geometry.plot_rect();
        assert!(!rect.is_valid());
    }
}
