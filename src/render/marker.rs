//! Built-in trend cursor marker: synthesis and command generation.

use std::fmt;
use std::sync::Arc;

use crate::cursor::{CursorId, CursorRecord};
use crate::geom::{ChartGeometry, ScreenPoint, ScreenRect};
use crate::overlay::{OverlayEntry, OverlaySynthesizer};
use crate::style::Theme;
use crate::transform::Transform;
use crate::view::TimeViewport;

use super::{
    Color, LineSegment, LineStyle, MarkerStyle, RectStyle, RenderCommand, RenderList, TextStyle,
};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Renderer-owned parts of one trend cursor marker.
///
/// Parts are positioned relative to the cursor line, so a marker built once
/// can be reused when the cursor moves.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorMarker {
    /// Palette color of the cursor.
    pub color: Color,
    /// Vertical line style.
    pub line: LineStyle,
    /// Header box size (width, height) above the plot area.
    pub header_size: (f32, f32),
    /// Header text style.
    pub header_text: TextStyle,
    /// Drag handle size (width, height) below the plot area.
    pub handle_size: (f32, f32),
    /// One value dot per series track, in track order.
    pub value_dots: Vec<MarkerStyle>,
    /// Series names used in value labels, in track order.
    pub value_labels: Vec<String>,
    /// Value label text style.
    pub value_text: TextStyle,
}

/// Synthesizes [`CursorMarker`] children for new overlay entries.
#[derive(Debug, Clone)]
pub struct MarkerSynthesizer {
    theme: Theme,
    header_size: (f32, f32),
    handle_size: (f32, f32),
}

impl MarkerSynthesizer {
    /// Create a synthesizer for the given theme.
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            header_size: (96.0, 20.0),
            handle_size: (10.0, 14.0),
        }
    }

    /// Set the header box size.
    pub fn with_header_size(mut self, width: f32, height: f32) -> Self {
        self.header_size = (width, height);
        self
    }

    /// Set the drag handle size.
    pub fn with_handle_size(mut self, width: f32, height: f32) -> Self {
        self.handle_size = (width, height);
        self
    }

    /// Access the theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

impl Default for MarkerSynthesizer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl OverlaySynthesizer for MarkerSynthesizer {
    type Children = CursorMarker;

    fn synthesize_children(
        &self,
        _id: &CursorId,
        record: &CursorRecord,
        geometry: &ChartGeometry,
    ) -> CursorMarker {
        let color = self.theme.cursor_color(record.color_index);
        CursorMarker {
            color,
            line: LineStyle {
                color: self.theme.line,
                width: 1.0,
            },
            header_size: self.header_size,
            header_text: TextStyle {
                color: self.theme.header_text,
                size: 11.0,
            },
            handle_size: self.handle_size,
            value_dots: geometry
                .series
                .iter()
                .map(|track| MarkerStyle {
                    color: track.color,
                    size: 7.0,
                })
                .collect(),
            value_labels: geometry.series.iter().map(|track| track.name.clone()).collect(),
            value_text: TextStyle {
                color: self.theme.value_text,
                size: 11.0,
            },
        }
    }
}

/// Lookup of series values at a cursor timestamp.
pub trait SeriesValues {
    /// Value of the series at `series_index` at the given time, if known.
    fn value_at(&self, series_index: usize, timestamp_ms: f64) -> Option<f64>;
}

impl<F> SeriesValues for F
where
    F: Fn(usize, f64) -> Option<f64>,
{
    fn value_at(&self, series_index: usize, timestamp_ms: f64) -> Option<f64> {
        self(series_index, timestamp_ms)
    }
}

/// Formatter for cursor header timestamps.
#[derive(Clone, Default)]
pub enum TimestampFormatter {
    /// `HH:MM:SS.mmm` in UTC.
    #[default]
    Default,
    /// Custom formatter callback.
    Custom(Arc<dyn Fn(f64) -> String + Send + Sync>),
}

impl TimestampFormatter {
    /// Format a timestamp for display.
    pub fn format(&self, timestamp_ms: f64) -> String {
        match self {
            Self::Default => format_time_of_day(timestamp_ms),
            Self::Custom(formatter) => formatter(timestamp_ms),
        }
    }
}

impl fmt::Debug for TimestampFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "TimestampFormatter::Default"),
            Self::Custom(_) => write!(f, "TimestampFormatter::Custom(..)"),
        }
    }
}

fn format_time_of_day(timestamp_ms: f64) -> String {
    // Tiny negative inputs round up to a full day.
    let day_ms = timestamp_ms.rem_euclid(MS_PER_DAY) as u64 % MS_PER_DAY as u64;
    let hours = day_ms / 3_600_000;
    let minutes = day_ms / 60_000 % 60;
    let seconds = day_ms / 1_000 % 60;
    let millis = day_ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Build draw commands for an overlay list.
///
/// Cursors outside the viewport are skipped. Entries without children have
/// nothing to draw and are skipped as well.
pub fn build_overlay_commands(
    overlays: &[Arc<OverlayEntry<CursorMarker>>],
    viewport: TimeViewport,
    geometry: &ChartGeometry,
    formatter: &TimestampFormatter,
    values: Option<&dyn SeriesValues>,
) -> RenderList {
    let mut render = RenderList::new();
    let Some(transform) = Transform::new(viewport, geometry) else {
        return render;
    };
    let plot = transform.screen();

    for entry in overlays {
        let Some(marker) = entry.children.as_deref() else {
            continue;
        };
        if !viewport.contains(entry.timestamp_ms) {
            continue;
        }
        let Some(x) = transform.timestamp_to_offset(entry.timestamp_ms) else {
            continue;
        };

        render.push(RenderCommand::ClipRect(plot));
        render.push(RenderCommand::LineSegments {
            segments: vec![LineSegment::new(
                ScreenPoint::new(x, plot.min.y),
                ScreenPoint::new(x, plot.max.y),
            )],
            style: marker.line,
        });
        if let Some(values) = values {
            push_series_values(&mut render, marker, &transform, values, entry.timestamp_ms, x);
        }
        render.push(RenderCommand::ClipEnd);

        let (header_w, header_h) = marker.header_size;
        let header = ScreenRect::new(
            ScreenPoint::new(x - header_w * 0.5, plot.min.y - header_h),
            ScreenPoint::new(x + header_w * 0.5, plot.min.y),
        );
        render.push(RenderCommand::Rect {
            rect: header,
            style: filled(marker.color),
        });
        render.push(RenderCommand::Text {
            position: ScreenPoint::new(header.min.x + 4.0, header.min.y + 3.0),
            text: formatter.format(entry.timestamp_ms),
            style: marker.header_text.clone(),
        });

        let (handle_w, handle_h) = marker.handle_size;
        render.push(RenderCommand::Rect {
            rect: ScreenRect::new(
                ScreenPoint::new(x - handle_w * 0.5, plot.max.y),
                ScreenPoint::new(x + handle_w * 0.5, plot.max.y + handle_h),
            ),
            style: filled(marker.color),
        });
    }

    render
}

fn push_series_values(
    render: &mut RenderList,
    marker: &CursorMarker,
    transform: &Transform,
    values: &dyn SeriesValues,
    timestamp_ms: f64,
    x: f32,
) {
    for (index, (dot, label)) in marker.value_dots.iter().zip(&marker.value_labels).enumerate() {
        let Some(value) = values.value_at(index, timestamp_ms) else {
            continue;
        };
        let Some(y) = transform.value_to_y(value) else {
            continue;
        };
        render.push(RenderCommand::Points {
            points: vec![ScreenPoint::new(x, y)],
            style: *dot,
        });
        render.push(RenderCommand::Text {
            position: ScreenPoint::new(x + 6.0, y - marker.value_text.size - 2.0),
            text: format!("{label}: {value:.2}"),
            style: marker.value_text.clone(),
        });
    }
}

fn filled(color: Color) -> RectStyle {
    RectStyle {
        fill: color,
        stroke: color,
        stroke_width: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::SeriesTrack;
    use crate::style::CURSOR_PALETTE;

    fn marker_entry(id: &str, ts: f64, geometry: &ChartGeometry) -> Arc<OverlayEntry<CursorMarker>> {
        let synthesizer = MarkerSynthesizer::default();
        let record = CursorRecord::new(ts, 1);
        let id = CursorId::new(id);
        let children = synthesizer.synthesize_children(&id, &record, geometry);
        Arc::new(OverlayEntry::new(id, ts, children))
    }

    #[test]
    fn marker_uses_palette_and_series() {
        let geometry = ChartGeometry::new(400.0, 300.0)
            .with_series(SeriesTrack::new("temperature", Color::new(1.0, 0.0, 0.0, 1.0)));
        let entry = marker_entry("tc", 10.0, &geometry);
        let marker = entry.children.as_deref().expect("children");
        assert_eq!(marker.color, CURSOR_PALETTE[1]);
        assert_eq!(
            marker.value_dots,
            vec![MarkerStyle {
                color: Color::new(1.0, 0.0, 0.0, 1.0),
                size: 7.0,
            }]
        );
        assert_eq!(marker.value_labels, vec!["temperature".to_string()]);
    }

    #[test]
    fn off_screen_cursors_are_not_drawn() {
        let geometry = ChartGeometry::new(400.0, 300.0);
        let overlays = [
            marker_entry("in", 500.0, &geometry),
            marker_entry("out", 5_000.0, &geometry),
        ];
        let render = build_overlay_commands(
            &overlays,
            TimeViewport::new(0.0, 1_000.0),
            &geometry,
            &TimestampFormatter::default(),
            None,
        );
        let lines = render
            .commands()
            .iter()
            .filter(|command| matches!(command, RenderCommand::LineSegments { .. }))
            .count();
        assert_eq!(lines, 1);
    }

    #[test]
    fn series_values_add_dots_and_labels() {
        let geometry = ChartGeometry::new(400.0, 300.0)
            .with_value_range(0.0, 30.0)
            .with_series(SeriesTrack::new("a", Color::BLACK))
            .with_series(SeriesTrack::new("b", Color::WHITE));
        let overlays = [marker_entry("tc", 500.0, &geometry)];
        let values = |index: usize, _ts: f64| (index == 0).then_some(12.5);
        let render = build_overlay_commands(
            &overlays,
            TimeViewport::new(0.0, 1_000.0),
            &geometry,
            &TimestampFormatter::default(),
            Some(&values as &dyn SeriesValues),
        );
        let labels: Vec<&str> = render
            .commands()
            .iter()
            .filter_map(|command| match command {
                RenderCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(labels.contains(&"a: 12.50"));
        assert!(!labels.iter().any(|label| label.starts_with("b:")));
    }

    #[test]
    fn default_formatter_prints_time_of_day() {
        let formatter = TimestampFormatter::default();
        assert_eq!(formatter.format(3_723_004.0), "01:02:03.004");
        assert_eq!(formatter.format(MS_PER_DAY + 1.0), "00:00:00.001");
    }

    #[test]
    fn default_formatter_wraps_values_just_below_midnight() {
        let formatter = TimestampFormatter::default();
        assert_eq!(formatter.format(-1e-13), "00:00:00.000");
        assert_eq!(formatter.format(-1.0), "23:59:59.999");
    }
}
