use std::sync::Arc;

use gpui::prelude::*;
use gpui::{
    MouseButton, MouseDownEvent, MouseMoveEvent, MouseUpEvent, Pixels, Point, Window, canvas, div,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::chart::ChartCursorSync;
use crate::geom::ScreenPoint;
use crate::interaction::CursorDrag;
use crate::render::{MarkerSynthesizer, SeriesValues, TimestampFormatter, build_overlay_commands};

use super::paint::{paint_commands, to_hsla};

type SharedSeriesValues = Arc<dyn SeriesValues + Send + Sync>;

/// A GPUI view that paints a chart's trend cursors.
///
/// Left click on the plot places a cursor, dragging a cursor line moves it,
/// and right click on a cursor line deletes it. Cursor changes from other
/// charts in the group are picked up on the next frame; hosts should call
/// `cx.notify()` on linked views when they want them redrawn immediately.
#[derive(Clone)]
pub struct GpuiCursorView {
    chart: Arc<Mutex<ChartCursorSync<MarkerSynthesizer>>>,
    state: Arc<Mutex<CursorUiState>>,
    formatter: TimestampFormatter,
    values: Option<SharedSeriesValues>,
}

#[derive(Debug, Clone)]
struct CursorUiState {
    origin: ScreenPoint,
    drag: Option<CursorDrag>,
}

impl Default for CursorUiState {
    fn default() -> Self {
        Self {
            origin: ScreenPoint::new(0.0, 0.0),
            drag: None,
        }
    }
}

impl GpuiCursorView {
    /// Create a view for the given chart and subscribe it to its group.
    pub fn new(mut chart: ChartCursorSync<MarkerSynthesizer>) -> Self {
        chart.attach();
        Self {
            chart: Arc::new(Mutex::new(chart)),
            state: Arc::new(Mutex::new(CursorUiState::default())),
            formatter: TimestampFormatter::default(),
            values: None,
        }
    }

    /// Use a custom header timestamp formatter.
    pub fn with_formatter(mut self, formatter: TimestampFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Show series values next to each cursor line.
    pub fn with_series_values(mut self, values: SharedSeriesValues) -> Self {
        self.values = Some(values);
        self
    }

    /// Get a handle for driving the chart from outside the view.
    pub fn chart_handle(&self) -> ChartHandle {
        ChartHandle {
            chart: Arc::clone(&self.chart),
        }
    }

    fn local_point(&self, position: Point<Pixels>) -> ScreenPoint {
        let origin = self.state.lock().origin;
        ScreenPoint::new(
            f32::from(position.x) - origin.x,
            f32::from(position.y) - origin.y,
        )
    }

    fn on_mouse_down(&mut self, ev: &MouseDownEvent, cx: &mut Context<Self>) {
        let pos = self.local_point(ev.position);
        let mut chart = self.chart.lock();
        let hit = chart.cursor_at(pos.x);

        match (ev.button, hit) {
            (MouseButton::Left, Some(id)) => {
                self.state.lock().drag = Some(CursorDrag::new(id, pos.x));
            }
            (MouseButton::Left, None) => {
                if chart.geometry().plot_rect().contains(pos)
                    && let Err(err) = chart.place_cursor_at(pos.x)
                {
                    debug!(%err, "trend cursor not placed");
                }
            }
            (MouseButton::Right, Some(id)) => {
                if let Err(err) = chart.delete_cursor(&id) {
                    debug!(%err, "trend cursor not deleted");
                }
            }
            _ => {}
        }

        cx.notify();
    }

    fn on_mouse_move(&mut self, ev: &MouseMoveEvent, cx: &mut Context<Self>) {
        let pos = self.local_point(ev.position);
        // Lock order: chart, then state.
        let mut chart = self.chart.lock();
        let mut state = self.state.lock();
        let Some(drag) = state.drag.as_mut() else {
            return;
        };
        if !drag.update(pos.x, chart.config().drag_threshold_px) {
            return;
        }
        if let Err(err) = chart.drag_cursor_to(&drag.id, pos.x) {
            debug!(%err, "trend cursor drag rejected");
            state.drag = None;
        }
        cx.notify();
    }

    fn on_mouse_up(&mut self, _ev: &MouseUpEvent, cx: &mut Context<Self>) {
        self.state.lock().drag = None;
        cx.notify();
    }
}

impl Render for GpuiCursorView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let chart = Arc::clone(&self.chart);
        let state = Arc::clone(&self.state);
        let formatter = self.formatter.clone();
        let values = self.values.clone();
        let background = self.chart.lock().synthesizer().theme().background;

        div()
            .size_full()
            .bg(to_hsla(background))
            .child(
                canvas(
                    move |bounds, _window, _| {
                        let mut chart = chart.lock();
                        let width = f32::from(bounds.size.width);
                        let height = f32::from(bounds.size.height);
                        if chart.geometry().width != width || chart.geometry().height != height {
                            let mut geometry = chart.geometry().clone();
                            geometry.width = width;
                            geometry.height = height;
                            chart.set_geometry(geometry);
                        }
                        if chart.has_pending_update() {
                            chart.refresh();
                        }

                        let origin =
                            ScreenPoint::new(f32::from(bounds.origin.x), f32::from(bounds.origin.y));
                        state.lock().origin = origin;

                        let mut render = build_overlay_commands(
                            chart.overlays(),
                            chart.viewport(),
                            chart.geometry(),
                            &formatter,
                            values.as_deref().map(|values| values as &dyn SeriesValues),
                        );
                        render.translate(origin.x, origin.y);
                        render
                    },
                    move |_, render, window, cx| {
                        paint_commands(&render, window, cx);
                    },
                )
                .size_full(),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_down(ev, cx);
                }),
            )
            .on_mouse_down(
                MouseButton::Right,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_down(ev, cx);
                }),
            )
            .on_mouse_move(cx.listener(|this, ev, _, cx| {
                this.on_mouse_move(ev, cx);
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_up(ev, cx);
                }),
            )
    }
}

/// A handle for driving the chart held inside a `GpuiCursorView`.
///
/// The handle clones cheaply and can be moved into async tasks.
#[derive(Clone)]
pub struct ChartHandle {
    chart: Arc<Mutex<ChartCursorSync<MarkerSynthesizer>>>,
}

impl ChartHandle {
    /// Read the chart state.
    ///
    /// The chart is locked for the duration of the callback.
    pub fn read<R>(&self, f: impl FnOnce(&ChartCursorSync<MarkerSynthesizer>) -> R) -> R {
        let chart = self.chart.lock();
        f(&chart)
    }

    /// Mutate the chart state.
    ///
    /// The chart is locked for the duration of the callback.
    pub fn write<R>(&self, f: impl FnOnce(&mut ChartCursorSync<MarkerSynthesizer>) -> R) -> R {
        let mut chart = self.chart.lock();
        f(&mut chart)
    }
}
