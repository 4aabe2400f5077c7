//! Benchmarks for markdown rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use inkpress::document::Renderer;
use inkpress::highlight::Highlighter;
use inkpress::transform::TransformPipeline;

fn bench_render_simple(c: &mut Criterion) {
    let highlighter = Highlighter::new(None);
    let transforms = TransformPipeline::standard();
    let renderer = Renderer::new(&highlighter, &transforms);
    let md = "# Hello\n\nWorld";
    c.bench_function("render_simple", |b| {
        b.iter(|| renderer.render(black_box(md)))
    });
}

fn bench_render_fixture(c: &mut Criterion) {
    let highlighter = Highlighter::new(None);
    let transforms = TransformPipeline::standard();
    let renderer = Renderer::new(&highlighter, &transforms);
    let md = include_str!("../tests/fixtures/sample.md");
    c.bench_function("render_fixture", |b| {
        b.iter(|| renderer.render(black_box(md)))
    });
}

criterion_group!(benches, bench_render_simple, bench_render_fixture);
criterion_main!(benches);
