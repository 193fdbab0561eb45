use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use orgchart_rs_renderer::layout::{Geometry, LayoutOptions, compute_positions};
use orgchart_rs_renderer::model::Node;
use orgchart_rs_renderer::tree::{classify_siblings, resolve_parents};
use orgchart_rs_renderer::{Chart, Document, DrawRequest, NodeSpec, SizeSpec, Style, SvgSurface};
use std::hint::black_box;

/// A company of `depth` levels where every manager has `fanout` reports,
/// with an assistant beside every third manager.
fn company(depth: usize, fanout: usize) -> Vec<NodeSpec> {
    let mut specs = vec![NodeSpec::new("n0").text("Chief Executive Officer")];
    let mut level = vec!["n0".to_string()];
    let mut next_id = 1usize;
    for _ in 1..depth {
        let mut next_level = Vec::new();
        for (pos, parent) in level.iter().enumerate() {
            if pos % 3 == 0 {
                let id = format!("n{next_id}");
                next_id += 1;
                specs.push(
                    NodeSpec::new(&id)
                        .parent(parent)
                        .connector("r")
                        .text("Assistant"),
                );
            }
            for _ in 0..fanout {
                let id = format!("n{next_id}");
                next_id += 1;
                specs.push(
                    NodeSpec::new(&id)
                        .parent(parent)
                        .text(format!("Department head {next_id}")),
                );
                next_level.push(id);
            }
        }
        level = next_level;
    }
    specs
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let style = Style::classic();
    let geometry = Geometry::from_style(&style);
    let options = LayoutOptions::default();
    for (depth, fanout) in [(3usize, 4usize), (4, 4), (4, 6)] {
        let name = format!("company_{depth}x{fanout}");
        let mut nodes: Vec<Node> = company(depth, fanout)
            .into_iter()
            .map(|spec| Node::from_spec(spec, &style))
            .collect();
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                for node in nodes.iter_mut() {
                    node.reset();
                }
                resolve_parents(&mut nodes);
                classify_siblings(&mut nodes);
                let summary =
                    compute_positions(black_box(&mut nodes), geometry, &options, Some(1201.0));
                black_box(summary.per_row);
            });
        });
    }
    group.finish();
}

fn bench_draw(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw");
    let request = DrawRequest {
        width: SizeSpec::Fixed(1200.0),
        height: SizeSpec::Auto,
        ..DrawRequest::default()
    };
    for (depth, fanout) in [(3usize, 4usize), (4, 4)] {
        let name = format!("company_{depth}x{fanout}");
        let mut chart = Chart::new();
        for spec in company(depth, fanout) {
            let _ = chart.add_node(spec);
        }
        let mut doc = Document::new();
        doc.add_canvas("bench", SvgSurface::new(true));
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let _ = chart.draw(&mut doc, "bench", request);
                let svg = doc.surface("bench").map(|s| s.to_svg()).unwrap_or_default();
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layout, bench_draw);
criterion_main!(benches);
