//! Canvas renderer: log-scale zoom/pan state, visible-range queries,
//! stride decimation and the coarse hit-test grid.
//!
//! The renderer owns the conversion between viewport pixels and data space.
//! Zoom is additive in natural-log space so repeated in/out steps invert
//! exactly; every zoom keeps the data point under the cursor fixed. Each
//! frame resolves the visible Y window to a row range through the data
//! view, sub-samples it to a bounded draw budget, and submits rectangles to
//! a [`RectBatch`] backend. Axis chrome is drawn after the data so it is
//! never obscured.

pub mod accel;
pub mod batch;

pub use accel::AccelBatch;
pub use batch::{create_batch, GpuContext, NullPresent, PresentTarget, RectBatch, SoftwareBatch};

use glam::Vec2;

use crate::data_view::DataView;
use crate::scales;

/// Hit-test grid resolution cap per axis, independent of zoom level.
pub const GRID_MAX: usize = 128;

const MARGIN_LEFT: f32 = 60.0;
const MARGIN_RIGHT: f32 = 8.0;
const MARGIN_TOP: f32 = 8.0;
const MARGIN_BOTTOM: f32 = 24.0;

/// Target drawn points per screen pixel row before decimation kicks in.
const OVERSAMPLE: f64 = 4.0;
/// Ranges smaller than this are never decimated, avoiding visible gaps at
/// small zoom-ins.
const NO_DECIMATE_BELOW: usize = 4096;
const MIN_TICK_SPACING_PX: f64 = 48.0;
/// Horizontal fit clamp: avoids absurdly wide cells for single-column data.
const MAX_FIT_SCALE_X: f64 = 64.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomAxis {
    Uniform,
    X,
    Y,
}

/// Receives tick-label text during a draw; the shell owns rasterization.
pub trait TextSink {
    fn label(&mut self, x: f32, y: f32, text: &str);
}

/// Discards labels.
impl TextSink for () {
    fn label(&mut self, _x: f32, _y: f32, _text: &str) {}
}

#[derive(Clone, Copy, Debug)]
pub struct ChartTheme {
    pub background: u32,
    pub axis_line: u32,
    pub tick_mark: u32,
    /// Point color when no color column is bound.
    pub point: u32,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background: 0x101010FF,
            axis_line: 0xFFFFFF33,
            tick_mark: 0xFFFFFF66,
            point: 0x56B4E9FF,
        }
    }
}

/// Coarse screen-cell -> last-drawn-row map, rebuilt every frame.
/// Last-writer-wins is an accepted imprecision of the approximation.
struct GridMap {
    cols: usize,
    rows: usize,
    cells: Vec<i32>,
}

impl GridMap {
    fn new() -> Self {
        Self {
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    fn reset(&mut self, cols: usize, rows: usize) {
        self.cols = cols.clamp(1, GRID_MAX);
        self.rows = rows.clamp(1, GRID_MAX);
        self.cells.clear();
        self.cells.resize(self.cols * self.rows, -1);
    }

    fn record(&mut self, cx: usize, cy: usize, row: usize) {
        if cx < self.cols && cy < self.rows {
            self.cells[cy * self.cols + cx] = row as i32;
        }
    }

    fn lookup(&self, cx: usize, cy: usize) -> Option<usize> {
        if cx >= self.cols || cy >= self.rows {
            return None;
        }
        match self.cells[cy * self.cols + cx] {
            -1 => None,
            row => Some(row as usize),
        }
    }
}

pub struct CanvasRenderer {
    view: DataView,
    scale_x_log: f64,
    scale_y_log: f64,
    offset_x: f64,
    offset_y: f64,
    width: f32,
    height: f32,
    device_scale: f32,
    theme: ChartTheme,
    grid: GridMap,
    frame_drawn: bool,
}

impl CanvasRenderer {
    /// Creates a renderer over `view`, starting from a fit-to-data state.
    pub fn new(view: DataView, width: f32, height: f32) -> Self {
        let mut renderer = Self {
            view,
            scale_x_log: 0.0,
            scale_y_log: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            width,
            height,
            device_scale: 1.0,
            theme: ChartTheme::default(),
            grid: GridMap::new(),
            frame_drawn: false,
        };
        renderer.fit_to_data();
        renderer
    }

    pub fn set_theme(&mut self, theme: ChartTheme) {
        self.theme = theme;
    }

    pub fn set_device_scale(&mut self, scale: f32) {
        self.device_scale = if scale > 0.0 { scale } else { 1.0 };
    }

    /// Replaces the bound view (new table or new spec) and refits.
    pub fn set_view(&mut self, view: DataView) {
        self.view = view;
        self.frame_drawn = false;
        self.fit_to_data();
    }

    pub fn view(&self) -> &DataView {
        &self.view
    }

    pub fn scale_logs(&self) -> (f64, f64) {
        (self.scale_x_log, self.scale_y_log)
    }

    pub fn offsets(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    fn scale_x(&self) -> f64 {
        scales::scale_from_log(self.scale_x_log)
    }

    fn scale_y(&self) -> f64 {
        scales::scale_from_log(self.scale_y_log)
    }

    fn plot_width(&self) -> f64 {
        (self.width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0) as f64
    }

    fn plot_height(&self) -> f64 {
        (self.height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0) as f64
    }

    /// Bottom edge of the plot area; data-space Y grows upward from here.
    fn plot_bottom(&self) -> f64 {
        (self.height - MARGIN_BOTTOM) as f64
    }

    pub fn screen_x(&self, data_x: f64) -> f64 {
        data_x * self.scale_x() - self.offset_x + MARGIN_LEFT as f64
    }

    pub fn screen_y(&self, data_y: f64) -> f64 {
        self.plot_bottom() - (data_y * self.scale_y() - self.offset_y)
    }

    pub fn data_x(&self, screen_x: f64) -> f64 {
        (screen_x - MARGIN_LEFT as f64 + self.offset_x) / self.scale_x()
    }

    pub fn data_y(&self, screen_y: f64) -> f64 {
        (self.plot_bottom() - screen_y + self.offset_y) / self.scale_y()
    }

    /// Applies one zoom step. `divisions` subdivides the base step (a wheel
    /// notch of 1 doubles/halves the scale); the data point under the
    /// cursor stays put on whichever axes are zoomed.
    pub fn zoom(&mut self, axis: ZoomAxis, cursor_x: f32, cursor_y: f32, zoom_in: bool, divisions: u32) {
        let step = std::f64::consts::LN_2 / divisions.max(1) as f64;
        let delta = if zoom_in { step } else { -step };

        if matches!(axis, ZoomAxis::Uniform | ZoomAxis::X) {
            let cur = cursor_x as f64 - MARGIN_LEFT as f64;
            let rel = cur + self.offset_x;
            let ratio = (self.scale_x_log + delta).exp() / self.scale_x();
            self.scale_x_log += delta;
            self.offset_x = rel * ratio - cur;
        }
        if matches!(axis, ZoomAxis::Uniform | ZoomAxis::Y) {
            let cur = self.plot_bottom() - cursor_y as f64;
            let rel = cur + self.offset_y;
            let ratio = (self.scale_y_log + delta).exp() / self.scale_y();
            self.scale_y_log += delta;
            self.offset_y = rel * ratio - cur;
        }
    }

    /// Pans by a screen-space delta in pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x -= dx as f64;
        self.offset_y += dy as f64;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    /// Scales so the full `[0, max_x] x [min_y, max_y]` extent exactly fills
    /// the plot area and the lowest Y sits on the bottom edge. Applying it
    /// twice is a no-op.
    pub fn fit_to_data(&mut self) {
        let span_x = (self.view.max_x().max(1)) as f64;
        let span_y = ((self.view.max_y() - self.view.min_y()).max(1)) as f64;

        let mut scale_x = self.plot_width() / span_x;
        let clamped = scale_x > MAX_FIT_SCALE_X;
        if clamped {
            scale_x = MAX_FIT_SCALE_X;
        }
        self.scale_x_log = scale_x.ln();
        self.offset_x = if clamped {
            // Recenter the narrow extent in the plot area.
            (span_x * scale_x - self.plot_width()) / 2.0
        } else {
            0.0
        };

        let scale_y = self.plot_height() / span_y;
        self.scale_y_log = scale_y.ln();
        self.offset_y = self.view.min_y() as f64 * scale_y;
    }

    /// Renders one frame into `batch`, emitting tick labels to `text`.
    pub fn draw(&mut self, batch: &mut dyn RectBatch, text: &mut dyn TextSink) {
        let table = self.view.table().clone();
        let table = table.read();

        let scale_x = self.scale_x();
        let scale_y = self.scale_y();
        let plot_w = self.plot_width();
        let plot_h = self.plot_height();

        // Visible data window.
        let x_min = self.data_x(MARGIN_LEFT as f64);
        let x_span = plot_w / scale_x;
        let y_min = self.data_y(self.plot_bottom());
        let y_span = plot_h / scale_y;

        // Hit-test grid: one cell per visible data cell, capped.
        let visible_cols = (x_span.ceil() as usize).max(1);
        let visible_rows = (y_span.ceil() as usize).max(1);
        self.grid.reset(visible_cols, visible_rows);
        self.frame_drawn = true;

        let start = self.view.start_index(&table, y_min.floor() as i64);
        let end = self.view.end_index(&table, (y_min + y_span).ceil() as i64 + 1);

        let step = self.decimation_step(table.row_count(), end.saturating_sub(start));

        batch.begin(self.width, self.height, self.device_scale);
        batch.fill_rect(0.0, 0.0, self.width, self.height, self.theme.background);

        let point_w = (scale_x as f32).clamp(1.0, 64.0);
        let point_h = (scale_y as f32).clamp(1.0, 64.0);
        let grid_cols = self.grid.cols;
        let grid_rows = self.grid.rows;

        let mut i = start;
        while i < end {
            let dx = self.view.x_value(&table, i) as f64;
            let dy = self.view.y_value(&table, i) as f64;
            let sx = self.screen_x(dx) as f32;
            let sy = self.screen_y(dy) as f32 - point_h;

            let visible = sx + point_w >= MARGIN_LEFT
                && sx <= self.width - MARGIN_RIGHT
                && sy + point_h >= MARGIN_TOP
                && sy <= self.height - MARGIN_BOTTOM;
            if visible {
                let color = self
                    .view
                    .color_rgba(&table, i)
                    .unwrap_or(self.theme.point);
                batch.fill_rect(sx, sy, point_w, point_h, color);
            }

            // The grid records by data cell, unclamped by the point size.
            let fx = (dx - x_min) / x_span;
            let fy = (dy - y_min) / y_span;
            if (0.0..1.0).contains(&fx) && (0.0..1.0).contains(&fy) {
                let cx = (fx * grid_cols as f64) as usize;
                let cy = (fy * grid_rows as f64) as usize;
                self.grid.record(cx, cy, i);
            }

            i += step;
        }

        self.draw_chrome(batch, text, x_min, x_span, y_min, y_span, scale_x, scale_y);

        batch.end();
    }

    /// Stride between sampled rows: average point density per data-unit of
    /// Y, scaled by how many data rows share one screen pixel, against a
    /// fixed oversampling target. Small ranges are never decimated.
    fn decimation_step(&self, total_rows: usize, range_len: usize) -> usize {
        if range_len < NO_DECIMATE_BELOW {
            return 1;
        }
        let data_height = ((self.view.max_y() - self.view.min_y()).max(1)) as f64;
        let density = total_rows as f64 / data_height;
        let step = (density * (1.0 / self.scale_y()) / OVERSAMPLE).floor();
        (step as usize).max(1)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_chrome(
        &self,
        batch: &mut dyn RectBatch,
        text: &mut dyn TextSink,
        x_min: f64,
        x_span: f64,
        y_min: f64,
        y_span: f64,
        scale_x: f64,
        scale_y: f64,
    ) {
        let bg = self.theme.background;

        // Margin-occluding rects, after the data pass so stray points never
        // bleed into the chrome.
        batch.fill_rect(0.0, 0.0, MARGIN_LEFT, self.height, bg);
        batch.fill_rect(
            self.width - MARGIN_RIGHT,
            0.0,
            MARGIN_RIGHT,
            self.height,
            bg,
        );
        batch.fill_rect(0.0, 0.0, self.width, MARGIN_TOP, bg);
        batch.fill_rect(
            0.0,
            self.height - MARGIN_BOTTOM,
            self.width,
            MARGIN_BOTTOM,
            bg,
        );

        // Axis lines.
        batch.fill_rect(
            MARGIN_LEFT - 1.0,
            MARGIN_TOP,
            1.0,
            self.height - MARGIN_TOP - MARGIN_BOTTOM,
            self.theme.axis_line,
        );
        batch.fill_rect(
            MARGIN_LEFT,
            self.height - MARGIN_BOTTOM,
            self.width - MARGIN_LEFT - MARGIN_RIGHT,
            1.0,
            self.theme.axis_line,
        );

        for tick in scales::ticks(x_min, x_min + x_span, scale_x, MIN_TICK_SPACING_PX) {
            let sx = self.screen_x(tick) as f32;
            batch.fill_rect(sx, self.height - MARGIN_BOTTOM, 1.0, 4.0, self.theme.tick_mark);
            let anchor = Vec2::new(sx, self.height - MARGIN_BOTTOM + 14.0);
            text.label(anchor.x, anchor.y, &scales::format_tick(tick));
        }
        for tick in scales::ticks(y_min, y_min + y_span, scale_y, MIN_TICK_SPACING_PX) {
            let sy = self.screen_y(tick) as f32;
            batch.fill_rect(MARGIN_LEFT - 5.0, sy, 4.0, 1.0, self.theme.tick_mark);
            let anchor = Vec2::new(MARGIN_LEFT - 8.0, sy);
            text.label(anchor.x, anchor.y, &scales::format_tick(tick));
        }
    }

    /// Resolves a screen position to the row drawn there in the last frame,
    /// recomputing the same plot-fraction cell mapping the draw used.
    pub fn hit_test(&self, screen_x: f32, screen_y: f32) -> Option<usize> {
        if !self.frame_drawn {
            return None;
        }
        let fx = (screen_x as f64 - MARGIN_LEFT as f64) / self.plot_width();
        let fy = (self.plot_bottom() - screen_y as f64) / self.plot_height();
        if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
            return None;
        }
        let cx = (fx * self.grid.cols as f64) as usize;
        let cy = (fy * self.grid.rows as f64) as usize;
        self.grid.lookup(cx, cy)
    }

    /// Tooltip text for the row under the cursor: every column's value at
    /// that row, dictionary-decoded, as `"name: value"` pairs. This is the
    /// one renderer read path that goes back to the raw column store.
    pub fn hover_text(&self, screen_x: f32, screen_y: f32) -> Option<String> {
        let row = self.hit_test(screen_x, screen_y)?;
        let table = self.view.table().read();
        let parts: Vec<String> = table
            .headers()
            .iter()
            .enumerate()
            .map(|(col, name)| format!("{}: {}", name, table.cell_text(row, col)))
            .collect();
        Some(parts.join(", "))
    }
}
