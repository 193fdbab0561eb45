use std::sync::mpsc::Sender;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::ChartError;
use crate::images::{ImageChannel, ImageEvent, ImageRequest};
use crate::interaction::{self, Cursor, MouseButton, Navigation};
use crate::layout::{self, Align, Geometry, LayoutOptions};
use crate::model::{ImageState, Node, NodeImage, NodeSpec};
use crate::render::{Painter, RenderOptions, Surface};
use crate::style::Style;
use crate::tree;

/// Reports failures to whoever operates the page.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Forwards alerts to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        warn!("{message}");
    }
}

/// Width or height of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeSpec {
    Fixed(f32),
    /// Follows the extent of the laid out chart.
    #[default]
    Auto,
    /// Follows the element that contains the surface.
    Container,
}

impl SizeSpec {
    /// Accepts a pixel count, `auto`, or `parent`/`container`. Anything else
    /// is treated as `auto`.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.to_ascii_lowercase().as_str() {
            "parent" | "container" => Self::Container,
            "auto" | "" => Self::Auto,
            _ => match token.trim_end_matches("px").parse::<f32>() {
                Ok(px) if px.is_finite() && px > 0.0 => Self::Fixed(px),
                _ => Self::Auto,
            },
        }
    }

    /// Pixel size of the surface including the extra pixel that keeps the
    /// half-pixel translated lines inside, or `None` when it follows the
    /// chart.
    fn resolve(self, container: Option<f32>) -> Option<f32> {
        let px = match self {
            Self::Fixed(px) => Some(px),
            Self::Container => container,
            Self::Auto => None,
        };
        px.filter(|px| *px > 0.0).map(|px| px.floor() + 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DrawRequest {
    pub width: SizeSpec,
    pub height: SizeSpec,
    pub align: Align,
}

/// What the last full draw used; a redraw paints with it again.
#[derive(Debug, Clone)]
struct Drawn {
    surface_id: String,
    request: DrawRequest,
    geometry: Geometry,
    per_row: usize,
}

/// One organization chart: its nodes, its style context and the surface it
/// was last drawn on.
pub struct Chart {
    nodes: Vec<Node>,
    style: Style,
    layout_options: LayoutOptions,
    render_options: RenderOptions,
    notifier: Box<dyn Notifier>,
    images: ImageChannel,
    duplicate_reported: bool,
    drawn: Option<Drawn>,
    cursor: Cursor,
}

impl Default for Chart {
    fn default() -> Self {
        Self::new()
    }
}

impl Chart {
    pub fn new() -> Self {
        Self::with_notifier(Box::new(LogNotifier))
    }

    pub fn with_notifier(notifier: Box<dyn Notifier>) -> Self {
        Self {
            nodes: Vec::new(),
            style: Style::classic(),
            layout_options: LayoutOptions::default(),
            render_options: RenderOptions::default(),
            notifier,
            images: ImageChannel::new(),
            duplicate_reported: false,
            drawn: None,
            cursor: Cursor::Default,
        }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Style context for nodes added from now on.
    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    pub fn set_size(
        &mut self,
        width: Option<f32>,
        height: Option<f32>,
        h_space: Option<f32>,
        v_space: Option<f32>,
        h_shift: Option<f32>,
    ) {
        self.style.set_size(width, height, h_space, v_space, h_shift);
    }

    pub fn set_node_style(&mut self, top: Option<f32>, bottom: Option<f32>, shadow: Option<f32>) {
        self.style.set_node_style(top, bottom, shadow);
    }

    pub fn set_font(
        &mut self,
        name: Option<&str>,
        size: Option<f32>,
        color: Option<&str>,
        v_centered: Option<bool>,
    ) {
        self.style.set_font(name, size, color, v_centered);
    }

    pub fn set_color(
        &mut self,
        box_line: Option<&str>,
        box_fill: Option<&str>,
        text: Option<&str>,
        line: Option<&str>,
    ) {
        self.style.set_color(box_line, box_fill, text, line);
    }

    pub fn layout_options_mut(&mut self) -> &mut LayoutOptions {
        &mut self.layout_options
    }

    pub fn render_options_mut(&mut self) -> &mut RenderOptions {
        &mut self.render_options
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Row capacity of the last full draw; 0 means unlimited.
    pub fn per_row(&self) -> usize {
        self.drawn.as_ref().map_or(0, |drawn| drawn.per_row)
    }

    pub fn surface_id(&self) -> Option<&str> {
        self.drawn.as_ref().map(|drawn| drawn.surface_id.as_str())
    }

    pub fn is_container_bound(&self) -> bool {
        self.drawn
            .as_ref()
            .is_some_and(|drawn| drawn.request.width == SizeSpec::Container)
    }

    /// Adds a node with the current style context. A node whose id is
    /// already taken is rejected; only the first such rejection is reported
    /// to the operator.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<usize, ChartError> {
        let node = Node::from_spec(spec, &self.style);
        if let Some(existing) = self.nodes.iter().position(|other| other.id == node.id) {
            if !self.duplicate_reported {
                self.duplicate_reported = true;
                self.notifier.alert(&format!(
                    "Duplicate node. Node '{}' is not added; further duplicates are skipped silently.",
                    node.id
                ));
            }
            return Err(ChartError::DuplicateId {
                id: node.id,
                existing,
            });
        }
        self.nodes.push(node);
        Ok(self.nodes.len() - 1)
    }

    /// Resets all positions, lays the chart out and paints it on the surface
    /// `surface_id`.
    pub fn draw(
        &mut self,
        doc: &mut Document,
        surface_id: &str,
        request: DrawRequest,
    ) -> Result<(), ChartError> {
        let Some(canvas) = doc.canvas(surface_id) else {
            return Err(self.surface_missing(surface_id));
        };
        let surface_width = request.width.resolve(canvas.container.map(|(w, _)| w));

        for node in &mut self.nodes {
            node.reset();
        }
        tree::resolve_parents(&mut self.nodes);
        tree::classify_siblings(&mut self.nodes);

        let geometry = Geometry::from_style(&self.style);
        let summary =
            layout::compute_positions(&mut self.nodes, geometry, &self.layout_options, surface_width);
        self.drawn = Some(Drawn {
            surface_id: surface_id.to_string(),
            request,
            geometry,
            per_row: summary.per_row,
        });
        self.paint(doc)
    }

    /// Paints the positions of the last full draw again without recomputing
    /// them. Does nothing before the first draw.
    pub fn redraw(&mut self, doc: &mut Document) -> Result<(), ChartError> {
        self.paint(doc)
    }

    /// Full draw with the last request, picking up a new container size.
    pub fn handle_resize(&mut self, doc: &mut Document) -> Result<(), ChartError> {
        match self.drawn.clone() {
            Some(drawn) => self.draw(doc, &drawn.surface_id, drawn.request),
            None => Ok(()),
        }
    }

    fn paint(&mut self, doc: &mut Document) -> Result<(), ChartError> {
        let Some(drawn) = self.drawn.clone() else {
            return Ok(());
        };
        let Some(canvas) = doc.canvas_mut(&drawn.surface_id) else {
            return Err(self.surface_missing(&drawn.surface_id));
        };
        let geo = drawn.geometry;
        let container = canvas.container;
        let width = drawn.request.width.resolve(container.map(|(w, _)| w));
        let height = drawn.request.height.resolve(container.map(|(_, h)| h));

        layout::align_nodes(&mut self.nodes, geo.box_width, drawn.request.align, width);
        let width = width.unwrap_or_else(|| {
            extent(&self.nodes, |node| node.x + geo.box_width + node.shadow_offset) + 1.0
        });
        let height = height.unwrap_or_else(|| {
            extent(&self.nodes, |node| node.y + geo.box_height + node.shadow_offset) + 1.0
        });

        canvas.surface.resize(width, height, self.render_options.pixel_ratio);
        painter(&self.style, &drawn, &self.layout_options).paint(&mut canvas.surface, &mut self.nodes);
        debug!(
            "painted {} nodes on '{}' ({}x{})",
            self.nodes.len(),
            drawn.surface_id,
            width,
            height
        );
        Ok(())
    }

    fn surface_missing(&self, surface_id: &str) -> ChartError {
        error!("drawing surface '{surface_id}' not found");
        self.notifier
            .alert(&format!("Canvas id '{surface_id}' not found"));
        ChartError::SurfaceNotFound(surface_id.to_string())
    }

    /// Moves every image that has not been requested yet to the loading
    /// state and returns the requests for the host.
    pub fn take_image_requests(&mut self) -> Vec<ImageRequest> {
        let mut requests = Vec::new();
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            if let Some(image) = node.image.as_mut()
                && matches!(image.state, ImageState::Pending)
            {
                image.state = ImageState::Loading;
                requests.push(ImageRequest {
                    node: idx,
                    source: image.source.clone(),
                });
            }
        }
        requests
    }

    /// Sender on which image loaders post completions.
    pub fn image_sender(&self) -> Sender<ImageEvent> {
        self.images.sender()
    }

    /// Gives the node a new image reference, which is requested again.
    pub fn replace_image(&mut self, idx: usize, source: impl Into<String>) -> bool {
        let source = source.into();
        let Some(node) = self.nodes.get_mut(idx) else {
            return false;
        };
        node.image = (!source.is_empty()).then(|| NodeImage {
            source,
            state: ImageState::Pending,
        });
        node.image_drawn = false;
        true
    }

    /// Applies the image completions received so far and paints the nodes
    /// whose image became available. Positions are never recomputed here.
    /// Returns the number of nodes painted.
    pub fn pump_images(&mut self, doc: &mut Document) -> usize {
        let mut ready = 0;
        for event in self.images.drain() {
            let Some(image) = self
                .nodes
                .get_mut(event.node)
                .and_then(|node| node.image.as_mut())
            else {
                continue;
            };
            if image.source != event.source {
                debug!("dropping stale image '{}'", event.source);
                continue;
            }
            match event.result {
                Ok(data) => {
                    debug!("image '{}' loaded, {}x{}", event.source, data.width, data.height);
                    image.state = ImageState::Ready(data);
                    ready += 1;
                }
                Err(message) => {
                    debug!("image '{}' failed: {message}", event.source);
                    image.state = ImageState::Failed(message);
                }
            }
        }
        if ready == 0 {
            return 0;
        }
        let Some(drawn) = self.drawn.clone() else {
            return 0;
        };
        let Some(canvas) = doc.canvas_mut(&drawn.surface_id) else {
            return 0;
        };
        painter(&self.style, &drawn, &self.layout_options)
            .paint_new_images(&mut canvas.surface, &mut self.nodes)
    }

    /// Cursor for a pointer at `(x, y)` in surface pixels.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Cursor {
        self.cursor = match &self.drawn {
            Some(drawn) => interaction::cursor_at(&self.nodes, &drawn.geometry, x, y),
            None => Cursor::Default,
        };
        self.cursor
    }

    pub fn pointer_leave(&mut self) -> Cursor {
        self.cursor = Cursor::Default;
        self.cursor
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn click(&mut self, x: f32, y: f32, button: MouseButton) -> Option<Navigation> {
        let drawn = self.drawn.as_ref()?;
        let navigation = interaction::click_at(&self.nodes, &drawn.geometry, x, y, button)?;
        self.cursor = Cursor::Default;
        Some(navigation)
    }
}

fn painter<'a>(style: &'a Style, drawn: &Drawn, options: &LayoutOptions) -> Painter<'a> {
    Painter {
        geometry: drawn.geometry,
        line_color: &style.line_color,
        shadow_color: &style.shadow_color,
        per_row: drawn.per_row,
        max_lines: options.retry_limit,
    }
}

fn extent(nodes: &[Node], edge: impl Fn(&Node) -> f32) -> f32 {
    nodes
        .iter()
        .filter(|node| node.placed)
        .map(edge)
        .fold(0.0, f32::max)
}
