use std::fmt::Write as _;

use crate::images::ImageData;

use super::text;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),
    Close,
}

/// An outline built up from moves, lines and quadratic curves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    ops: Vec<PathOp>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.ops.push(PathOp::MoveTo(x, y));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.ops.push(PathOp::LineTo(x, y));
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.ops.push(PathOp::QuadTo(cx, cy, x, y));
    }

    pub fn close(&mut self) {
        self.ops.push(PathOp::Close);
    }

    /// Straight segment from `from` to `to`.
    pub fn segment(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.move_to(from.0, from.1);
        self.line_to(to.0, to.1);
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close();
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn to_svg_data(&self) -> String {
        let mut d = String::new();
        for op in &self.ops {
            if !d.is_empty() {
                d.push(' ');
            }
            let _ = match *op {
                PathOp::MoveTo(x, y) => write!(d, "M {x:.2} {y:.2}"),
                PathOp::LineTo(x, y) => write!(d, "L {x:.2} {y:.2}"),
                PathOp::QuadTo(cx, cy, x, y) => write!(d, "Q {cx:.2} {cy:.2} {x:.2} {y:.2}"),
                PathOp::Close => write!(d, "Z"),
            };
        }
        d
    }
}

/// Resolved font of a text run.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

/// A 2D drawing target with canvas-like semantics: every call paints on
/// top of what is already there, and resizing clears it.
pub trait Surface {
    /// Sets the logical size in pixels. The backing store is `pixel_ratio`
    /// times larger and all drawing is scaled to match.
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32);

    /// Logical size in pixels.
    fn size(&self) -> (f32, f32);

    fn stroke_path(&mut self, path: &Path, color: &str, line_width: f32);

    fn fill_path(&mut self, path: &Path, color: &str);

    fn draw_image(&mut self, image: &ImageData, x: f32, y: f32, width: f32, height: f32);

    /// Draws one line of text horizontally centered on `center_x`, with its
    /// top edge at `top`.
    fn fill_text(&mut self, line: &str, center_x: f32, top: f32, font: &FontSpec, color: &str);

    fn measure_text(&self, line: &str, font: &FontSpec) -> f32;
}

/// Distance from the top of a line box to the baseline, relative to the
/// font size.
const BASELINE_RATIO: f32 = 0.9;

/// Surface that records drawing operations as SVG elements.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f32,
    height: f32,
    pixel_ratio: f32,
    fast_text_metrics: bool,
    background: Option<String>,
    elements: Vec<String>,
}

impl SvgSurface {
    pub fn new(fast_text_metrics: bool) -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
            fast_text_metrics,
            background: None,
            elements: Vec::new(),
        }
    }

    pub fn with_options(options: &super::RenderOptions) -> Self {
        Self::new(options.fast_text_metrics).with_background(options.background.clone())
    }

    pub fn with_background(mut self, color: Option<String>) -> Self {
        self.background = color.filter(|c| !c.is_empty());
        self
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Number of drawing operations since the last resize.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn to_svg(&self) -> String {
        let ratio = self.pixel_ratio;
        let (w, h) = (self.width * ratio, self.height * ratio);
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
        );
        if let Some(color) = &self.background {
            let _ = write!(
                svg,
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                escape_xml(color)
            );
        }
        let _ = write!(svg, "<g transform=\"scale({ratio}) translate(0.5 0.5)\">");
        for element in &self.elements {
            svg.push_str(element);
        }
        svg.push_str("</g></svg>");
        svg
    }
}

impl Surface for SvgSurface {
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.pixel_ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        self.elements.clear();
    }

    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn stroke_path(&mut self, path: &Path, color: &str, line_width: f32) {
        if path.is_empty() {
            return;
        }
        self.elements.push(format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{line_width}\"/>",
            path.to_svg_data(),
            escape_xml(color)
        ));
    }

    fn fill_path(&mut self, path: &Path, color: &str) {
        if path.is_empty() {
            return;
        }
        self.elements.push(format!(
            "<path d=\"{}\" fill=\"{}\"/>",
            path.to_svg_data(),
            escape_xml(color)
        ));
    }

    fn draw_image(&mut self, image: &ImageData, x: f32, y: f32, width: f32, height: f32) {
        self.elements.push(format!(
            "<image x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
            image.data_uri()
        ));
    }

    fn fill_text(&mut self, line: &str, center_x: f32, top: f32, font: &FontSpec, color: &str) {
        let baseline = top + font.size * BASELINE_RATIO;
        let weight = if font.bold { "bold" } else { "normal" };
        let style = if font.italic { "italic" } else { "normal" };
        self.elements.push(format!(
            "<text x=\"{center_x:.2}\" y=\"{baseline:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{weight}\" font-style=\"{style}\" fill=\"{}\">{}</text>",
            escape_xml(&font.family),
            font.size,
            escape_xml(color),
            escape_xml(line)
        ));
    }

    fn measure_text(&self, line: &str, font: &FontSpec) -> f32 {
        text::text_width(line, font, self.fast_text_metrics)
    }
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
