//! Mapping between timestamps and chart pixels.

use crate::geom::{ChartGeometry, ScreenRect};
use crate::view::{Range, TimeViewport};

const MIN_SPAN: f64 = 1e-12;

/// Transform from time/value coordinates into screen coordinates.
#[derive(Debug, Clone)]
pub struct Transform {
    viewport: TimeViewport,
    screen: ScreenRect,
    time_axis: Range,
    value_axis: Range,
}

impl Transform {
    /// Create a transform for the given viewport and chart geometry.
    ///
    /// Returns `None` if the viewport is not finite or the plot area is empty.
    pub fn new(viewport: TimeViewport, geometry: &ChartGeometry) -> Option<Self> {
        let screen = geometry.plot_rect();
        if !screen.is_valid() || !viewport.range().is_finite() {
            return None;
        }
        if !geometry.value_range.is_finite() {
            return None;
        }
        Some(Self {
            viewport,
            screen,
            time_axis: viewport.range().with_min_span(MIN_SPAN),
            value_axis: geometry.value_range.with_min_span(MIN_SPAN),
        })
    }

    /// Access the viewport.
    pub fn viewport(&self) -> TimeViewport {
        self.viewport
    }

    /// Access the plot rectangle.
    pub fn screen(&self) -> ScreenRect {
        self.screen
    }

    /// Map a timestamp onto the X pixel axis.
    ///
    /// Timestamps outside the viewport map outside the plot rectangle.
    pub fn timestamp_to_offset(&self, timestamp_ms: f64) -> Option<f32> {
        if !timestamp_ms.is_finite() {
            return None;
        }
        let norm = (timestamp_ms - self.time_axis.min) / self.time_axis.span();
        Some((self.screen.min.x as f64 + norm * self.screen.width() as f64) as f32)
    }

    /// Map an X pixel position back into a timestamp.
    pub fn offset_to_timestamp(&self, offset_x: f32) -> Option<f64> {
        if !offset_x.is_finite() {
            return None;
        }
        let norm = (offset_x as f64 - self.screen.min.x as f64) / self.screen.width() as f64;
        Some(self.time_axis.min + norm * self.time_axis.span())
    }

    /// Map a series value onto the Y pixel axis.
    pub fn value_to_y(&self, value: f64) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let norm = (value - self.value_axis.min) / self.value_axis.span();
        Some((self.screen.max.y as f64 - norm * self.screen.height() as f64) as f32)
    }
}

/// Map a timestamp to its X pixel offset on a chart.
pub fn timestamp_to_offset(
    timestamp_ms: f64,
    viewport: TimeViewport,
    geometry: &ChartGeometry,
) -> Option<f32> {
    Transform::new(viewport, geometry)?.timestamp_to_offset(timestamp_ms)
}

/// Map an X pixel offset on a chart back to a timestamp.
pub fn offset_to_timestamp(
    offset_x: f32,
    viewport: TimeViewport,
    geometry: &ChartGeometry,
) -> Option<f64> {
    Transform::new(viewport, geometry)?.offset_to_timestamp(offset_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Margins;

    fn geometry() -> ChartGeometry {
        ChartGeometry::new(200.0, 100.0).with_margins(Margins {
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
        })
    }

    #[test]
    fn timestamp_roundtrip() {
        let viewport = TimeViewport::new(1_000.0, 2_000.0);
        let offset = timestamp_to_offset(1_250.0, viewport, &geometry()).expect("offset");
        assert!((offset - 50.0).abs() < 1e-3);
        let back = offset_to_timestamp(offset, viewport, &geometry()).expect("timestamp");
        assert!((back - 1_250.0).abs() < 1e-6);
    }

    #[test]
    fn value_axis_points_up() {
        let viewport = TimeViewport::new(0.0, 10.0);
        let geometry = geometry().with_value_range(0.0, 30.0);
        let transform = Transform::new(viewport, &geometry).expect("transform");
        let top = transform.value_to_y(30.0).expect("y");
        let bottom = transform.value_to_y(0.0).expect("y");
        assert!(top < bottom);
        assert!((bottom - 100.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_non_finite_inputs() {
        let viewport = TimeViewport::new(0.0, f64::INFINITY);
        assert!(Transform::new(viewport, &geometry()).is_none());
        let transform = Transform::new(TimeViewport::new(0.0, 1.0), &geometry()).expect("transform");
        assert!(transform.timestamp_to_offset(f64::NAN).is_none());
    }
}
