use std::sync::Arc;

use parking_lot::RwLock;

use trace_chart::data_view::DataView;
use trace_chart::render::{CanvasRenderer, RectBatch, ZoomAxis};
use trace_chart::table::{Column, ColumnKind, SharedTable, Table};
use trace_chart::view_spec::{AxisSpec, ViewSpec};

/// Records rectangle submissions without rasterizing anything.
#[derive(Default)]
struct CountingBatch {
    begun: usize,
    ended: usize,
    rects: Vec<(f32, f32, f32, f32, u32)>,
}

impl RectBatch for CountingBatch {
    fn begin(&mut self, _width: f32, _height: f32, _scale_factor: f32) {
        self.begun += 1;
        self.rects.clear();
    }
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: u32) {
        self.rects.push((x, y, w, h, color));
    }
    fn end(&mut self) {
        self.ended += 1;
    }
}

fn view_of(rows: &[(i32, i32)]) -> DataView {
    // Two columns: y (monotone) and x.
    let mut table = Table::new();
    table.set_headers(vec!["t".into(), "v".into()]);
    table.set_columns(vec![
        Column::new(ColumnKind::Integer),
        Column::new(ColumnKind::Integer),
    ]);
    for (t, v) in rows {
        table.column_mut(0).push_int(*t);
        table.column_mut(1).push_int(*v);
        table.commit_row();
    }
    let shared: SharedTable = Arc::new(RwLock::new(table));
    let spec = ViewSpec {
        x: AxisSpec::single("v"),
        y: AxisSpec::single("t"),
        color_field: None,
        derived: Default::default(),
    };
    DataView::build(shared, &spec).unwrap()
}

fn small_renderer() -> CanvasRenderer {
    let rows: Vec<(i32, i32)> = (0..200).map(|i| (i, (i * 7) % 101)).collect();
    CanvasRenderer::new(view_of(&rows), 800.0, 600.0)
}

#[test]
fn test_zoom_preserves_point_under_cursor() {
    let mut r = small_renderer();
    for (axis, cx, cy) in [
        (ZoomAxis::Uniform, 400.0, 300.0),
        (ZoomAxis::X, 123.0, 456.0),
        (ZoomAxis::Y, 700.0, 50.0),
        (ZoomAxis::Uniform, 61.0, 575.0),
    ] {
        let before = (r.data_x(cx as f64), r.data_y(cy as f64));
        r.zoom(axis, cx, cy, true, 1);
        let after = (r.data_x(cx as f64), r.data_y(cy as f64));
        assert!((before.0 - after.0).abs() < 1e-9, "x moved under cursor");
        assert!((before.1 - after.1).abs() < 1e-9, "y moved under cursor");
    }
}

#[test]
fn test_zoom_steps_are_exact_inverses() {
    let mut r = small_renderer();
    let initial = r.scale_logs();
    for _ in 0..10 {
        r.zoom(ZoomAxis::Uniform, 321.0, 222.0, true, 3);
    }
    for _ in 0..10 {
        r.zoom(ZoomAxis::Uniform, 321.0, 222.0, false, 3);
    }
    let back = r.scale_logs();
    // Additive log steps cancel, with at most rounding in the last place.
    assert!((initial.0 - back.0).abs() < 1e-12);
    assert!((initial.1 - back.1).abs() < 1e-12);
}

#[test]
fn test_fit_to_data_is_idempotent() {
    let mut r = small_renderer();
    r.zoom(ZoomAxis::Uniform, 100.0, 100.0, true, 1);
    r.pan(40.0, -25.0);

    r.fit_to_data();
    let once = (r.scale_logs(), r.offsets());
    r.fit_to_data();
    let twice = (r.scale_logs(), r.offsets());
    assert_eq!(once, twice);
}

#[test]
fn test_fit_places_min_y_on_bottom_edge() {
    let rows: Vec<(i32, i32)> = (10..50).map(|i| (i, i)).collect();
    let mut r = CanvasRenderer::new(view_of(&rows), 640.0, 480.0);
    r.fit_to_data();
    // Bottom plot edge is height - bottom margin.
    let bottom = r.screen_y(10.0);
    assert!((bottom - 456.0).abs() < 1e-6);
}

#[test]
fn test_pan_moves_data_with_cursor() {
    let mut r = small_renderer();
    let sx = r.screen_x(42.0);
    let sy = r.screen_y(17.0);
    r.pan(30.0, -12.0);
    assert!((r.screen_x(42.0) - (sx + 30.0)).abs() < 1e-9);
    assert!((r.screen_y(17.0) - (sy - 12.0)).abs() < 1e-9);
}

#[test]
fn test_resize_keeps_zoom_state() {
    let mut r = small_renderer();
    let scales = r.scale_logs();
    r.resize(1024.0, 768.0);
    assert_eq!(r.scale_logs(), scales);
}

#[test]
fn test_draw_brackets_batch_and_draws_points() {
    let mut r = small_renderer();
    let mut batch = CountingBatch::default();
    r.draw(&mut batch, &mut ());
    assert_eq!(batch.begun, 1);
    assert_eq!(batch.ended, 1);
    // Background + 200 points + margins + axes + ticks.
    assert!(batch.rects.len() > 200);
}

#[test]
fn test_decimation_bounds_drawn_points() {
    let rows: Vec<(i32, i32)> = (0..40_000).map(|i| (i, i % 257)).collect();
    let mut r = CanvasRenderer::new(view_of(&rows), 800.0, 600.0);
    let mut batch = CountingBatch::default();
    r.draw(&mut batch, &mut ());
    // 40k rows map to a ~570px plot; the stride keeps submissions near the
    // oversampling budget instead of the row count.
    assert!(batch.rects.len() < 10_000, "drew {}", batch.rects.len());
    assert!(batch.rects.len() > 100);
}

#[test]
fn test_small_ranges_are_not_decimated() {
    let rows: Vec<(i32, i32)> = (0..300).map(|i| (i, i % 7)).collect();
    let mut r = CanvasRenderer::new(view_of(&rows), 800.0, 600.0);
    let mut batch = CountingBatch::default();
    r.draw(&mut batch, &mut ());
    let point_color = trace_chart::ChartTheme::default().point;
    let points = batch
        .rects
        .iter()
        .filter(|(_, _, _, _, c)| *c == point_color)
        .count();
    assert_eq!(points, 300);
}

#[test]
fn test_hit_test_finds_drawn_row() {
    let rows: Vec<(i32, i32)> = (0..64).map(|i| (i, i)).collect();
    let mut r = CanvasRenderer::new(view_of(&rows), 800.0, 600.0);
    let mut batch = CountingBatch::default();
    r.draw(&mut batch, &mut ());

    let sx = r.screen_x(31.0) as f32;
    let sy = r.screen_y(31.0) as f32;
    let hit = r.hit_test(sx, sy).expect("a row under the cursor");
    // Last-writer-wins in a coarse cell; the diagonal makes it exact.
    assert_eq!(hit, 31);
}

#[test]
fn test_hit_test_misses_empty_space_and_margins() {
    let rows: Vec<(i32, i32)> = (0..64).map(|i| (i, 0)).collect();
    let mut r = CanvasRenderer::new(view_of(&rows), 800.0, 600.0);
    assert_eq!(r.hit_test(400.0, 300.0), None, "no frame drawn yet");

    let mut batch = CountingBatch::default();
    r.draw(&mut batch, &mut ());
    // Inside the left margin.
    assert_eq!(r.hit_test(5.0, 300.0), None);
    // In the plot but far from the single data column.
    assert_eq!(r.hit_test(790.0, 10.0), None);
}

#[test]
fn test_hover_text_reads_all_columns() {
    let rows: Vec<(i32, i32)> = (0..64).map(|i| (i, i)).collect();
    let mut r = CanvasRenderer::new(view_of(&rows), 800.0, 600.0);
    let mut batch = CountingBatch::default();
    r.draw(&mut batch, &mut ());

    let sx = r.screen_x(20.0) as f32;
    let sy = r.screen_y(20.0) as f32;
    let text = r.hover_text(sx, sy).expect("hover hits a row");
    assert_eq!(text, "t: 20, v: 20");
}

#[test]
fn test_tick_labels_emitted() {
    struct Labels(Vec<String>);
    impl trace_chart::TextSink for Labels {
        fn label(&mut self, _x: f32, _y: f32, text: &str) {
            self.0.push(text.to_string());
        }
    }

    let mut r = small_renderer();
    let mut batch = CountingBatch::default();
    let mut labels = Labels(Vec::new());
    r.draw(&mut batch, &mut labels);
    assert!(!labels.0.is_empty());
    // 1/2/5 ladder: every label is a clean decimal.
    for label in &labels.0 {
        assert!(label.parse::<f64>().is_ok(), "unparsable label {label:?}");
    }
}
