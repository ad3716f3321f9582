//! Visible ranges used to place trend cursors.

/// Numeric range with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Range {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut min: f64, mut max: f64) -> Self {
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self { min, max }
    }

    /// Span of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Check whether both bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Check whether the range has positive span and finite bounds.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.span() > 0.0
    }

    /// Check whether a value lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Ensure the range has at least the given span.
    pub fn with_min_span(&self, min_span: f64) -> Self {
        let span = self.span();
        if span >= min_span {
            return *self;
        }
        let center = (self.min + self.max) * 0.5;
        let half = min_span * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// Visible time range of a chart, in epoch milliseconds.
///
/// The viewport only affects where a cursor is drawn and whether it is drawn
/// at all. Cursor existence and timestamps are reconciled independently of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeViewport {
    /// Start of the visible window (ms).
    pub start_ms: f64,
    /// End of the visible window (ms).
    pub end_ms: f64,
}

impl TimeViewport {
    /// Create a viewport, swapping bounds if needed.
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        let range = Range::new(start_ms, end_ms);
        Self {
            start_ms: range.min,
            end_ms: range.max,
        }
    }

    /// The viewport as a plain range.
    pub fn range(&self) -> Range {
        Range {
            min: self.start_ms,
            max: self.end_ms,
        }
    }

    /// Duration of the window in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    /// Check whether the window is finite with a positive duration.
    pub fn is_valid(&self) -> bool {
        self.range().is_valid()
    }

    /// Check whether a timestamp is visible.
    pub fn contains(&self, timestamp_ms: f64) -> bool {
        self.range().contains(timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_with_min_span_expands() {
        let range = Range::new(2.0, 2.0);
        let expanded = range.with_min_span(1.0);
        assert!(expanded.span() >= 1.0);
        assert!(((expanded.min + expanded.max) * 0.5 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn viewport_swaps_reversed_bounds() {
        let viewport = TimeViewport::new(2_000.0, 1_000.0);
        assert_eq!(viewport.start_ms, 1_000.0);
        assert_eq!(viewport.end_ms, 2_000.0);
        assert!(viewport.contains(1_500.0));
        assert!(!viewport.contains(2_000.5));
    }

    #[test]
    fn zero_duration_viewport_is_invalid() {
        assert!(!TimeViewport::new(5.0, 5.0).is_valid());
        assert!(!TimeViewport::new(0.0, f64::INFINITY).is_valid());
    }
}
