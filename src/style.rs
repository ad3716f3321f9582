//! Cursor palette and theming.

use crate::render::Color;

/// Fixed palette trend cursor headers pick their color from.
pub const CURSOR_PALETTE: [Color; 5] = [
    Color::new(0.498, 0.278, 0.867, 1.0),
    Color::new(0.110, 0.612, 0.827, 1.0),
    Color::new(0.937, 0.471, 0.137, 1.0),
    Color::new(0.118, 0.655, 0.322, 1.0),
    Color::new(0.835, 0.208, 0.443, 1.0),
];

/// Visual theme for cursor overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Chart background.
    pub background: Color,
    /// Vertical cursor line.
    pub line: Color,
    /// Header text drawn on top of the palette color.
    pub header_text: Color,
    /// Series value label text.
    pub value_text: Color,
}

impl Theme {
    /// Create the default (light) theme.
    pub fn new() -> Self {
        Self::light()
    }

    /// Light theme.
    pub fn light() -> Self {
        Self {
            background: Color::WHITE,
            line: Color::BLACK,
            header_text: Color::WHITE,
            value_text: Color::BLACK,
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            background: Color::new(0.08, 0.09, 0.11, 1.0),
            line: Color::new(0.85, 0.87, 0.9, 1.0),
            header_text: Color::WHITE,
            value_text: Color::new(0.85, 0.87, 0.9, 1.0),
        }
    }

    /// Palette color for a cursor color index.
    pub fn cursor_color(&self, color_index: usize) -> Color {
        CURSOR_PALETTE[color_index % CURSOR_PALETTE.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_color_wraps_palette() {
        let theme = Theme::default();
        assert_eq!(theme.cursor_color(0), theme.cursor_color(CURSOR_PALETTE.len()));
    }
}
