//! Rendering primitives for cursor overlays.
//!
//! These types are backend-agnostic and are used by render backends (such as the
//! GPUI backend) to describe how trend cursors should be drawn.

mod marker;

pub use marker::{
    CursorMarker, MarkerSynthesizer, SeriesValues, TimestampFormatter, build_overlay_commands,
};

use crate::geom::{ScreenPoint, ScreenRect};

/// RGBA color in linear space.
///
/// All components are expected to be in the 0.0..=1.0 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Create a new color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
}

/// Line stroke styling.
///
/// The width is expressed in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
        }
    }
}

/// Marker styling for series value dots.
///
/// Marker sizes are expressed in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// Marker color.
    pub color: Color,
    /// Marker size in pixels.
    pub size: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 4.0,
        }
    }
}

/// Rectangle styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectStyle {
    /// Fill color.
    pub fill: Color,
    /// Stroke color.
    pub stroke: Color,
    /// Stroke width.
    pub stroke_width: f32,
}

impl Default for RectStyle {
    fn default() -> Self {
        Self {
            fill: Color::new(0.0, 0.0, 0.0, 0.0),
            stroke: Color::BLACK,
            stroke_width: 1.0,
        }
    }
}

/// Text styling.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Text color.
    pub color: Color,
    /// Font size in pixels.
    pub size: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 12.0,
        }
    }
}

/// A line segment in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    /// Segment start.
    pub start: ScreenPoint,
    /// Segment end.
    pub end: ScreenPoint,
}

impl LineSegment {
    /// Create a new line segment.
    pub fn new(start: ScreenPoint, end: ScreenPoint) -> Self {
        Self { start, end }
    }
}

/// Render command list.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Start clipping to a rectangle.
    ClipRect(ScreenRect),
    /// End clipping.
    ClipEnd,
    /// Draw line segments.
    LineSegments {
        /// Segments to draw.
        segments: Vec<LineSegment>,
        /// Styling for the segments.
        style: LineStyle,
    },
    /// Draw scatter points.
    Points {
        /// Points to draw.
        points: Vec<ScreenPoint>,
        /// Marker styling.
        style: MarkerStyle,
    },
    /// Draw a rectangle.
    Rect {
        /// Rectangle bounds.
        rect: ScreenRect,
        /// Rectangle styling.
        style: RectStyle,
    },
    /// Draw text.
    Text {
        /// Text position.
        position: ScreenPoint,
        /// Text content.
        text: String,
        /// Text styling.
        style: TextStyle,
    },
}

/// Aggregated render commands.
#[derive(Debug, Default, Clone)]
pub struct RenderList {
    commands: Vec<RenderCommand>,
}

impl RenderList {
    /// Create an empty render list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a render command.
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Access all render commands.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Shift every command by a pixel offset.
    ///
    /// Backends use this to move chart-local commands into window space.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        let shift = |point: &mut ScreenPoint| {
            point.x += dx;
            point.y += dy;
        };
        for command in &mut self.commands {
            match command {
                RenderCommand::ClipRect(rect) | RenderCommand::Rect { rect, .. } => {
                    shift(&mut rect.min);
                    shift(&mut rect.max);
                }
                RenderCommand::ClipEnd => {}
                RenderCommand::LineSegments { segments, .. } => {
                    for segment in segments {
                        shift(&mut segment.start);
                        shift(&mut segment.end);
                    }
                }
                RenderCommand::Points { points, .. } => {
                    for point in points {
                        shift(point);
                    }
                }
                RenderCommand::Text { position, .. } => shift(position),
            }
        }
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_moves_every_command() {
        let mut render = RenderList::new();
        let rect = ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(10.0, 10.0));
        render.push(RenderCommand::ClipRect(rect));
        render.push(RenderCommand::LineSegments {
            segments: vec![LineSegment::new(
                ScreenPoint::new(1.0, 0.0),
                ScreenPoint::new(1.0, 10.0),
            )],
            style: LineStyle::default(),
        });
        render.push(RenderCommand::ClipEnd);
        render.translate(5.0, -2.0);

        match &render.commands()[0] {
            RenderCommand::ClipRect(rect) => {
                assert_eq!(rect.min, ScreenPoint::new(5.0, -2.0));
                assert_eq!(rect.max, ScreenPoint::new(15.0, 8.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
        match &render.commands()[1] {
            RenderCommand::LineSegments { segments, .. } => {
                assert_eq!(segments[0].end, ScreenPoint::new(6.0, 8.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(render.len(), 3);
    }
}
