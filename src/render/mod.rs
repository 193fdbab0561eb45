pub mod image;
pub mod surface;
pub mod text;

pub use surface::{FontSpec, Path, PathOp, Surface, SvgSurface};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;

use crate::layout::{Geometry, end_of_downline};
use crate::model::{ConnectorType, Node};

use self::image::{BoxShape, Rect, place_image, text_area};

/// Horizontal room kept free around text inside a box.
const TEXT_PADDING: f32 = 16.0;
const PLACEHOLDER_FILL: &str = "#FFFFFF";
const PLACEHOLDER_BORDER: &str = "#000000";
const PLACEHOLDER_CROSS: &str = "#FF0000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Device pixels per logical pixel.
    pub pixel_ratio: f32,
    /// Measure ASCII text with the built-in width table instead of fonts.
    pub fast_text_metrics: bool,
    pub background: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            fast_text_metrics: false,
            background: None,
        }
    }
}

/// Everything besides the nodes that a paint needs.
#[derive(Debug, Clone, Copy)]
pub struct Painter<'a> {
    pub geometry: Geometry,
    pub line_color: &'a str,
    pub shadow_color: &'a str,
    /// Row capacity of the last layout; 0 means unlimited.
    pub per_row: usize,
    pub max_lines: usize,
}

impl Painter<'_> {
    /// Connectors first, then every box on top.
    pub fn paint(&self, surface: &mut dyn Surface, nodes: &mut [Node]) {
        self.draw_connectors(surface, nodes);
        for idx in 0..nodes.len() {
            self.draw_node(surface, nodes, idx);
        }
    }

    /// Repaints the nodes whose image became available since they were last
    /// drawn. Returns how many were painted.
    pub fn paint_new_images(&self, surface: &mut dyn Surface, nodes: &mut [Node]) -> usize {
        let pending: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.placed
                    && !node.image_drawn
                    && node.image.as_ref().is_some_and(|image| image.ready().is_some())
            })
            .map(|(idx, _)| idx)
            .collect();
        for &idx in &pending {
            self.draw_node(surface, nodes, idx);
        }
        pending.len()
    }

    /// All connector lines as one path in the line color.
    pub fn draw_connectors(&self, surface: &mut dyn Surface, nodes: &[Node]) {
        let mut path = Path::new();
        for idx in 0..nodes.len() {
            self.connectors_of(&mut path, nodes, idx);
        }
        surface.stroke_path(&path, self.line_color, 1.0);
    }

    fn connectors_of(&self, path: &mut Path, nodes: &[Node], idx: usize) {
        let geo = &self.geometry;
        let (bw, bh, hs, vs) = (geo.box_width, geo.box_height, geo.h_space, geo.v_space);
        let node = &nodes[idx];
        if !node.placed {
            return;
        }
        let (x, y) = (node.x, node.y);
        let mid_x = |n: &Node| n.x + bw / 2.0;

        // Up-line of an under-child, side line of a lateral sibling.
        if let Some(parent) = node.parent {
            match node.connector {
                ConnectorType::Under => {
                    path.segment((x + bw / 2.0, y), (x + bw / 2.0, y - vs / 2.0));
                }
                ConnectorType::Left => {
                    path.segment((x + bw, y + bh / 2.0), (mid_x(&nodes[parent]), y + bh / 2.0));
                }
                ConnectorType::Right => {
                    path.segment((x, y + bh / 2.0), (mid_x(&nodes[parent]), y + bh / 2.0));
                }
            }
        }

        if let Some(end) = end_of_downline(nodes, geo, idx) {
            path.segment((x + bw / 2.0, y + bh), (x + bw / 2.0, end));
        }

        let under = &node.under;
        match under.len() {
            0 => {}
            1 => {
                // Joins an under-child that is not straight below its parent.
                let child = &nodes[under[0]];
                let level = child.y - vs / 2.0;
                path.segment((mid_x(child), level), (x + bw / 2.0, level));
            }
            count => {
                let first = &nodes[under[0]];
                let per_row = if self.per_row == 0 { count } else { self.per_row };
                let row_end = |row: usize| under[((row + 1) * per_row).min(count) - 1];
                let level = first.y - vs / 2.0;
                path.segment((mid_x(first), level), (mid_x(&nodes[row_end(0)]), level));

                let rows = count.div_ceil(per_row);
                for row in 1..rows {
                    let level = first.y + (vs + bh) * row as f32 - vs / 2.0;
                    // Step down from the end of the previous row.
                    let prev = &nodes[under[row * per_row - 1]];
                    let turn_x = prev.x + bw + hs / 2.0;
                    path.segment((mid_x(prev), prev.y - vs / 2.0), (turn_x, prev.y - vs / 2.0));
                    path.segment((turn_x, prev.y - vs / 2.0), (turn_x, prev.y + bh + vs / 2.0));
                    path.segment((turn_x, prev.y + bh + vs / 2.0), (mid_x(first), level));
                    path.segment((mid_x(first), level), (mid_x(&nodes[row_end(row)]), level));
                }
            }
        }
    }

    /// Shadow, box, image or placeholder, then text.
    pub fn draw_node(&self, surface: &mut dyn Surface, nodes: &mut [Node], idx: usize) {
        let geo = &self.geometry;
        let node = &nodes[idx];
        if !node.placed {
            return;
        }
        let (x, y) = (node.x, node.y);
        let shape = BoxShape {
            width: geo.box_width,
            height: geo.box_height,
            top_radius: node.top_radius,
            bottom_radius: node.bottom_radius,
        };

        if node.shadow_offset > 0.0 {
            let shadow = rounded_box(x + node.shadow_offset, y + node.shadow_offset, &shape);
            surface.fill_path(&shadow, self.shadow_color);
        }
        let outline = rounded_box(x, y, &shape);
        surface.fill_path(&outline, &node.fill_color);
        surface.stroke_path(&outline, &node.border_color, if node.bold { 2.0 } else { 1.0 });

        let mut area = (0.0, 0.0, shape.width, shape.height);
        let mut image_drawn = false;
        if let Some(image) = &node.image {
            let ready = image.ready();
            let natural = ready.map(|data| (data.width as f32, data.height as f32));
            let placed = place_image(&shape, natural, node.image_align, node.image_valign);
            match ready {
                Some(data) => {
                    surface.draw_image(data, x + placed.x, y + placed.y, placed.width, placed.height);
                    image_drawn = true;
                }
                None if placed.height > 0.0 => {
                    draw_placeholder(surface, x + placed.x, y + placed.y, placed.width, placed.height);
                }
                None => {}
            }
            area = text_area(&shape, &placed, node.image_align, node.image_valign);
        }

        self.draw_text(surface, node, (x + area.0, y + area.1, area.2, area.3));
        nodes[idx].image_drawn = image_drawn;
    }

    fn draw_text(&self, surface: &mut dyn Surface, node: &Node, area: Rect) {
        let (left, top, width, height) = area;
        let font = text::font_spec(&node.font, node.font_size);
        let measure = |line: &str| surface.measure_text(line, &font);
        let mut lines = text::wrap_text(&node.text, width - TEXT_PADDING, self.max_lines, measure);

        let size = node.font_size;
        if size * lines.len() as f32 > height {
            lines.truncate((height / size).floor().max(0.0) as usize);
        }
        let lines: Vec<String> = lines
            .iter()
            .map(|line| text::fit_line(line, width, measure))
            .collect();

        let mut offset = if node.v_centered {
            ((height - lines.len() as f32 * size) / 2.0).floor()
        } else {
            0.0
        };
        let center = left + width / 2.0;
        for line in lines {
            surface.fill_text(&line, center, top + offset, &font, &node.text_color);
            offset += size.floor();
        }
    }
}

/// Box outline with quadratic corners; a zero radius gives a square corner.
fn rounded_box(x: f32, y: f32, shape: &BoxShape) -> Path {
    let (w, h) = (shape.width, shape.height);
    let (top, bottom) = (shape.top_radius, shape.bottom_radius);
    let mut path = Path::new();
    path.move_to(x + top, y);
    path.line_to(x + w - top, y);
    if top > 0.0 {
        path.quad_to(x + w, y, x + w, y + top);
    }
    path.line_to(x + w, y + h - bottom);
    if bottom > 0.0 {
        path.quad_to(x + w, y + h, x + w - bottom, y + h);
    }
    path.line_to(x + bottom, y + h);
    if bottom > 0.0 {
        path.quad_to(x, y + h, x, y + h - bottom);
    }
    path.line_to(x, y + top);
    if top > 0.0 {
        path.quad_to(x, y, x + top, y);
    }
    path.close();
    path
}

/// White square with a black outline and a red diagonal cross.
fn draw_placeholder(surface: &mut dyn Surface, x: f32, y: f32, width: f32, height: f32) {
    let mut frame = Path::new();
    frame.rect(x, y, width, height);
    surface.fill_path(&frame, PLACEHOLDER_FILL);
    surface.stroke_path(&frame, PLACEHOLDER_BORDER, 1.0);

    let mut cross = Path::new();
    cross.segment((x + 1.0, y + 1.0), (x + width - 1.0, y + height - 1.0));
    cross.segment((x + width - 1.0, y + 1.0), (x + 1.0, y + height - 1.0));
    surface.stroke_path(&cross, PLACEHOLDER_CROSS, 1.0);
}

pub fn write_output_svg(svg: &str, output: Option<&FsPath>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &FsPath, font_family: &str) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = font_family.to_string();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{ImageData, tiny_png};
    use crate::layout::testing::laid_out;
    use crate::model::{ImageState, NodeSpec};
    use crate::style::Style;

    fn painter(style: &Style, per_row: usize) -> Painter<'_> {
        Painter {
            geometry: Geometry::from_style(style),
            line_color: &style.line_color,
            shadow_color: &style.shadow_color,
            per_row,
            max_lines: 9,
        }
    }

    fn surface() -> SvgSurface {
        let mut surface = SvgSurface::new(true);
        surface.resize(801.0, 200.0, 1.0);
        surface
    }

    #[test]
    fn connectors_are_one_path_in_line_color() {
        let style = Style::classic();
        let nodes = laid_out(
            vec![
                NodeSpec::new("R"),
                NodeSpec::new("C1").parent("R"),
                NodeSpec::new("C2").parent("R"),
            ],
            Some(801.0),
        );
        let mut surface = surface();
        painter(&style, 5).draw_connectors(&mut surface, &nodes);
        assert_eq!(surface.element_count(), 1);
        let path = &surface.elements()[0];
        assert!(path.contains("stroke=\"#3388DD\""));
        // Downline from the bottom of R to the yoke.
        assert!(path.contains("M 130.00 33.00 L 130.00 43.00"));
        // Yoke between the two children.
        assert!(path.contains("M 60.00 43.00 L 200.00 43.00"));
    }

    #[test]
    fn bold_nodes_get_a_thicker_border() {
        let style = Style::classic();
        let mut nodes = laid_out(vec![NodeSpec::new("R").text("Boss").bold(true)], Some(801.0));
        let mut surface = surface();
        painter(&style, 5).paint(&mut surface, &mut nodes);
        let svg = surface.to_svg();
        assert!(svg.contains("stroke-width=\"2\""));
        assert!(svg.contains("fill=\"#A1A1A1\""));
        assert!(svg.contains(">Boss</text>"));
    }

    #[test]
    fn pending_image_draws_placeholder_then_real_image() {
        let style = Style::classic();
        let mut nodes = laid_out(
            vec![NodeSpec::new("R").text("Jane").image("jane.png", Some("lm"))],
            Some(801.0),
        );
        let before: Vec<(f32, f32)> = nodes.iter().map(|n| (n.x, n.y)).collect();
        let mut surface = surface();
        let painter = painter(&style, 5);
        painter.paint(&mut surface, &mut nodes);
        let svg = surface.to_svg();
        assert!(svg.contains("stroke=\"#FF0000\""));
        assert!(!svg.contains("<image"));
        assert!(!nodes[0].image_drawn);

        let data = ImageData::decode("jane.png", tiny_png()).unwrap();
        if let Some(image) = nodes[0].image.as_mut() {
            image.state = ImageState::Ready(data);
        }
        assert_eq!(painter.paint_new_images(&mut surface, &mut nodes), 1);
        assert!(nodes[0].image_drawn);
        assert!(surface.to_svg().contains("<image"));
        assert_eq!(painter.paint_new_images(&mut surface, &mut nodes), 0);
        let after: Vec<(f32, f32)> = nodes.iter().map(|n| (n.x, n.y)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn text_is_clipped_to_box_height() {
        let style = Style::classic();
        let mut nodes = laid_out(
            vec![NodeSpec::new("R").text("one[br]two[br]three[br]four")],
            Some(801.0),
        );
        let mut surface = surface();
        painter(&style, 5).paint(&mut surface, &mut nodes);
        let texts = surface
            .elements()
            .iter()
            .filter(|element| element.starts_with("<text"))
            .count();
        // 30px box with 12px text fits two lines.
        assert_eq!(texts, 2);
    }

    #[test]
    fn wrapped_rows_get_stepped_connectors() {
        let style = Style::classic();
        let mut specs = vec![NodeSpec::new("R")];
        for idx in 0..4 {
            specs.push(NodeSpec::new(format!("C{idx}")).parent("R"));
        }
        let nodes = laid_out(specs, Some(401.0));
        let mut surface = surface();
        painter(&style, 3).draw_connectors(&mut surface, &nodes);
        let path = &surface.elements()[0];
        // Turn point right of the last child of the first row (x 280).
        assert!(path.contains("L 410.00 43.00"));
        assert!(path.contains("M 410.00 43.00 L 410.00 93.00"));
    }
}
