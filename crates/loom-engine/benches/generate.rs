//! End-to-end generation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loom_core::EngineConfig;
use loom_engine::{Engine, MemorySource};
use serde_json::{json, Value};

const CONFIG: &str = r##"{
    "color_threshold": 2.0,
    "spacing_steps": [4, 8, 12, 16, 24, 32],
    "font_steps": [12, 14, 16, 20, 24],
    "max_fetch_retries": 0,
    "fetch_timeout_ms": 1000,
    "palette": { "ink": "#111827", "muted": "#6b7280", "white": "#ffffff", "primary": "#2563eb" },
    "viewport_width": 1440,
    "layout": { "overlap_epsilon": 0.01, "row_overlap_threshold": 0.5, "align_epsilon": 0.02 }
}"##;

fn row(index: usize, y: f64) -> Value {
    let id = |suffix: &str| format!("row{index}-{suffix}");
    json!({
        "id": id("frame"), "kind": "frame",
        "geometry": { "x": 24, "y": y, "width": 1392, "height": 48 },
        "children": [
            { "id": id("label"), "kind": "text", "characters": format!("Row {index}"),
              "geometry": { "x": 24, "y": y + 14.0, "width": 600, "height": 20 },
              "style": { "fill": "#111827", "fontSize": 15 } },
            { "id": id("value"), "kind": "text", "characters": "42",
              "geometry": { "x": 640, "y": y + 14.0, "width": 200, "height": 20 },
              "style": { "fill": "#6b7281", "fontSize": 14 } },
            { "id": id("badge"), "kind": "frame",
              "geometry": { "x": 1380, "y": y + 4.0, "width": 32, "height": 16 },
              "style": { "fill": "#2563eb", "cornerRadius": 8 } }
        ]
    })
}

fn table(rows: usize) -> String {
    let children: Vec<Value> = (0..rows).map(|i| row(i, 24.0 + i as f64 * 56.0)).collect();
    json!({
        "name": "Table",
        "root": {
            "id": "table", "kind": "frame",
            "geometry": { "x": 0, "y": 0, "width": 1440, "height": 48.0 + rows as f64 * 56.0 },
            "style": { "fill": "#ffffff" },
            "children": children
        }
    })
    .to_string()
}

fn generate(c: &mut Criterion) {
    let config: EngineConfig = serde_json::from_str(CONFIG).unwrap();
    let engine = Engine::new(&config).unwrap();
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    for rows in [10, 200] {
        let source = MemorySource::new().with_tree("table", table(rows));
        c.bench_function(&format!("generate_{rows}_rows"), |b| {
            b.iter(|| runtime.block_on(engine.generate(black_box(&source), "table")).unwrap())
        });
    }
}

criterion_group!(benches, generate);
criterion_main!(benches);
