use std::path::{Path, PathBuf};

use orgchart_rs_renderer::images::load_requests;
use orgchart_rs_renderer::{
    Chart, ChartError, ChartFile, Config, Document, DrawRequest, LayoutOptions, Node, NodeSpec,
    SizeSpec, Surface, SvgSurface, load_chart_file,
};

const BOX_WIDTH: f32 = 120.0;
const BOX_HEIGHT: f32 = 30.0;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> ChartFile {
    load_chart_file(&fixture(name)).expect("fixture load failed")
}

fn draw_file(file: &ChartFile, container: (f32, f32)) -> (Chart, Document) {
    draw_with(file, container, LayoutOptions::default())
}

fn draw_with(file: &ChartFile, container: (f32, f32), layout: LayoutOptions) -> (Chart, Document) {
    let mut config = Config::default();
    config.render.fast_text_metrics = true;
    config.layout = layout;
    let (mut chart, request, _) = file.build(&config);
    let mut doc = Document::new();
    doc.add_canvas("chart", SvgSurface::with_options(&config.render));
    doc.set_container_size("chart", container.0, container.1);
    chart.draw(&mut doc, "chart", request).expect("draw failed");
    (chart, doc)
}

fn node<'a>(chart: &'a Chart, id: &str) -> &'a Node {
    chart.node(id).unwrap_or_else(|| panic!("node {id} missing"))
}

fn overlapping(nodes: &[Node]) -> Vec<(String, String)> {
    let mut hits = Vec::new();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if a.x < b.x + BOX_WIDTH
                && b.x < a.x + BOX_WIDTH
                && a.y < b.y + BOX_HEIGHT
                && b.y < a.y + BOX_HEIGHT
            {
                hits.push((a.id.clone(), b.id.clone()));
            }
        }
    }
    hits
}

fn positions(chart: &Chart) -> Vec<(f32, f32)> {
    chart.nodes().iter().map(|n| (n.x, n.y)).collect()
}

#[test]
fn siblings_under_one_parent_share_a_row() {
    let (chart, doc) = draw_file(&load("basic.json"), (1200.0, 800.0));
    let (r, c1, c2) = (node(&chart, "R"), node(&chart, "C1"), node(&chart, "C2"));
    assert!((c1.y - c2.y).abs() < 1e-3);
    assert!(c1.y > r.y);
    assert!((c1.x - c2.x).abs() >= BOX_WIDTH);
    // Parent centered over its two children.
    assert!((r.x - (c1.x + c2.x) / 2.0).abs() < 1e-3);

    let surface = doc.surface("chart").expect("surface");
    assert_eq!(surface.size().0, 801.0);
    let svg = surface.to_svg();
    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains("stroke=\"#123456\""));
    assert!(svg.contains(">CEO</text>"));
    assert!(svg.contains(">CFO</text>"));
}

#[test]
fn mixed_chart_is_collision_free_and_stable() {
    let file = load("mixed.json");
    let (mut chart, mut doc) = draw_file(&file, (1200.0, 800.0));
    assert!(chart.nodes().iter().all(|n| n.placed));
    assert!(overlapping(chart.nodes()).is_empty(), "{:?}", overlapping(chart.nodes()));

    let ghost = node(&chart, "ghost");
    assert!(ghost.is_root());
    assert!(ghost.parent_id.is_none());

    let (r, al, a) = (node(&chart, "R"), node(&chart, "AL"), node(&chart, "A"));
    assert!(al.x < a.x);
    assert!(al.y > a.y);
    assert!(node(&chart, "S").x > r.x);

    let first = positions(&chart);
    let request = DrawRequest {
        width: SizeSpec::Fixed(1200.0),
        ..DrawRequest::default()
    };
    chart.draw(&mut doc, "chart", request).expect("second draw");
    assert_eq!(first, positions(&chart));

    let svg = doc.surface("chart").map(|s| s.to_svg()).unwrap_or_default();
    assert!(svg.contains("stroke-width=\"2\""));
}

#[test]
fn wider_containers_never_need_more_rows() {
    let file = load("wide.json5");
    let (narrow, _) = draw_file(&file, (400.0, 300.0));
    let (wide, _) = draw_file(&file, (1000.0, 300.0));
    assert_eq!(narrow.per_row(), 3);
    assert_eq!(wide.per_row(), 7);

    let bottom = |chart: &Chart| chart.nodes().iter().map(|n| n.y).fold(0.0, f32::max);
    assert!(bottom(&wide) <= bottom(&narrow));
    assert!(bottom(&wide) < bottom(&narrow));
    assert!(overlapping(narrow.nodes()).is_empty());
    assert!(overlapping(wide.nodes()).is_empty());
}

#[test]
fn centered_chart_sits_in_the_middle() {
    let file = load("wide.json5");
    let (chart, _) = draw_file(&file, (1000.0, 300.0));
    let min = chart.nodes().iter().map(|n| n.x).fold(f32::INFINITY, f32::min);
    let max = chart.nodes().iter().map(|n| n.x).fold(0.0, f32::max) + BOX_WIDTH;
    // Surface is 1001 wide.
    assert!((min - (1001.0 - max)).abs() < 1.0, "min {min}, max {max}");
}

#[test]
fn fixed_row_capacity_wraps_reports_in_pairs() {
    let layout = LayoutOptions {
        row_capacity: Some(2),
        ..LayoutOptions::default()
    };
    let (chart, doc) = draw_with(&load("wide.json5"), (1000.0, 300.0), layout);
    assert_eq!(chart.per_row(), 2);
    let e = |idx: usize| node(&chart, &format!("E{idx}"));
    for (a, b) in [(1, 2), (3, 4), (5, 6)] {
        assert!((e(a).y - e(b).y).abs() < 1e-3);
        assert!((e(b).x - e(a).x - BOX_WIDTH - 20.0).abs() < 1e-3);
    }
    assert!(e(3).y > e(1).y);
    assert!(e(5).y > e(3).y);
    assert!((e(1).x - e(3).x).abs() < 1e-3);
    assert!((e(1).x - e(5).x).abs() < 1e-3);
    assert!(overlapping(chart.nodes()).is_empty());

    // One yoke per row, joined by steps to the right of each full row.
    let svg = doc.surface("chart").map(|s| s.to_svg()).unwrap_or_default();
    let turn_x = e(2).x + BOX_WIDTH + 10.0;
    assert!(svg.contains(&format!("L {turn_x:.2} {:.2}", e(2).y - 10.0)));
}

#[test]
fn subtree_centering_keeps_boxes_apart() {
    let layout = LayoutOptions {
        center_over_subtree: true,
        ..LayoutOptions::default()
    };
    for name in ["wide.json5", "basic.json"] {
        let (chart, _) = draw_with(&load(name), (1000.0, 300.0), layout.clone());
        assert!(chart.nodes().iter().all(|n| n.placed), "{name}");
        assert!(
            overlapping(chart.nodes()).is_empty(),
            "{name}: {:?}",
            overlapping(chart.nodes())
        );
    }
}

#[test]
fn zero_retries_still_draw_every_node() {
    let layout = LayoutOptions {
        retry_limit: 0,
        ..LayoutOptions::default()
    };
    let (chart, doc) = draw_with(&load("mixed.json"), (1200.0, 800.0), layout);
    assert!(chart.nodes().iter().all(|n| n.placed));
    assert!(chart.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
    let surface = doc.surface("chart").expect("surface");
    assert_eq!(surface.size().0, 1201.0);
    assert!(surface.to_svg().starts_with("<svg"));
}

#[test]
fn duplicate_ids_leave_one_node() {
    let mut chart = Chart::new();
    chart.add_node(NodeSpec::new("A").text("first")).expect("first add");
    let err = chart.add_node(NodeSpec::new("A").text("second"));
    assert!(matches!(err, Err(ChartError::DuplicateId { .. })));
    let matching: Vec<&Node> = chart.nodes().iter().filter(|n| n.id == "A").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].text, "first");
}

#[test]
fn parent_cycles_resolve_into_a_forest() {
    let mut chart = Chart::new();
    for spec in [
        NodeSpec::new("a").parent("b"),
        NodeSpec::new("b").parent("a"),
        NodeSpec::new("c").parent("c"),
        NodeSpec::new("d").parent("a"),
        NodeSpec::new("e").parent("d").connector("r"),
    ] {
        chart.add_node(spec).expect("add");
    }
    let mut doc = Document::new();
    doc.add_canvas("chart", SvgSurface::new(true));
    chart
        .draw(&mut doc, "chart", DrawRequest::default())
        .expect("draw");

    let nodes = chart.nodes();
    for start in 0..nodes.len() {
        let mut cur = start;
        let mut steps = 0;
        while let Some(parent) = nodes[cur].parent {
            cur = parent;
            steps += 1;
            assert!(steps <= nodes.len(), "cycle through {}", nodes[start].id);
        }
    }
    assert!(nodes.iter().all(|n| n.placed));
    assert!(overlapping(nodes).is_empty());
}

#[test]
fn missing_surface_fails_only_that_chart() {
    let mut broken = Chart::new();
    broken.add_node(NodeSpec::new("x")).expect("add");
    let mut fine = Chart::new();
    fine.add_node(NodeSpec::new("y")).expect("add");

    let mut doc = Document::new();
    doc.add_canvas("present", SvgSurface::new(true));
    let err = broken.draw(&mut doc, "absent", DrawRequest::default());
    assert!(matches!(err, Err(ChartError::SurfaceNotFound(_))));
    fine.draw(&mut doc, "present", DrawRequest::default())
        .expect("other chart draws");
    assert!(fine.nodes()[0].placed);
}

#[test]
fn image_placeholder_is_replaced_once_loaded() {
    let dir = std::env::temp_dir().join(format!("orgr-suite-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let png = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 128, 255, 255]));
    png.save(dir.join("face.png")).expect("write png");

    let mut chart = Chart::new();
    chart
        .add_node(NodeSpec::new("R").text("Jane").image("face.png", Some("lm")))
        .expect("add");
    chart.add_node(NodeSpec::new("C").parent("R")).expect("add");
    let mut doc = Document::new();
    doc.add_canvas("chart", SvgSurface::new(true));
    let request = DrawRequest {
        width: SizeSpec::Fixed(600.0),
        ..DrawRequest::default()
    };
    chart.draw(&mut doc, "chart", request).expect("draw");

    let before = positions(&chart);
    let svg = doc.surface("chart").map(|s| s.to_svg()).unwrap_or_default();
    assert!(svg.contains("stroke=\"#FF0000\""));
    assert!(!svg.contains("<image"));

    let requests = chart.take_image_requests();
    assert_eq!(requests.len(), 1);
    let sent = load_requests(&requests, Some(dir.as_path()), &chart.image_sender());
    assert_eq!(sent, 1);
    assert_eq!(chart.pump_images(&mut doc), 1);

    let svg = doc.surface("chart").map(|s| s.to_svg()).unwrap_or_default();
    assert!(svg.contains("<image"));
    assert!(chart.nodes()[0].image_drawn);
    assert_eq!(before, positions(&chart));

    let _ = std::fs::remove_dir_all(&dir);
}
