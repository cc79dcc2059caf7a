//! Minimal end-to-end demo: synthesize a wave trace, load it, auto-pick a
//! view, render one frame through the software backend and print what sits
//! under a cursor position.
//!
//! Run with: cargo run --example viewer_demo

use trace_chart::data_view::DataView;
use trace_chart::loader::{CancelToken, LoadObserver, LoadOptions, LoadTask};
use trace_chart::render::{CanvasRenderer, PresentTarget, SoftwareBatch};
use trace_chart::schema;
use trace_chart::stream::MemSource;

struct StdoutProgress;

impl LoadObserver for StdoutProgress {
    fn progress(&mut self, lines: u64) {
        println!("  …{lines} lines");
    }
    fn finished(&mut self, rows: usize) {
        println!("loaded {rows} rows");
    }
}

struct FrameStats;

impl PresentTarget for FrameStats {
    fn present(&mut self, pixels: &[u32], width: u32, height: u32) {
        let lit = pixels.iter().filter(|&&p| p != 0).count();
        println!("presented {width}x{height} frame, {lit} lit pixels");
    }
}

fn main() -> eyre::Result<()> {
    let mut input = String::from("cycle\tcu\twf\tstate\n");
    for cycle in 0..5_000 {
        for cu in 0..8 {
            for wf in 0..4 {
                let state = (cycle + cu * 3 + wf) % 4;
                input.push_str(&format!("{cycle}\t{cu}\t{wf}\t{state}\n"));
            }
        }
    }

    let mut task = LoadTask::new(
        Box::new(MemSource::new(input.into_bytes())),
        LoadOptions::default(),
        CancelToken::new(),
    );
    task.run(&mut StdoutProgress);

    let table = task.table();
    let spec = schema::select_view(&table.read());
    println!("selected view:\n{}", spec.to_json());

    let view = DataView::build(table, &spec)?;
    let mut renderer = CanvasRenderer::new(view, 1024.0, 768.0);
    let mut batch = SoftwareBatch::new(Box::new(FrameStats));
    renderer.draw(&mut batch, &mut ());

    let (cx, cy) = (512.0, 384.0);
    match renderer.hover_text(cx, cy) {
        Some(text) => println!("under cursor: {text}"),
        None => println!("nothing under the cursor"),
    }
    Ok(())
}
