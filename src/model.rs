use crate::images::ImageData;
use crate::style::Style;

/// Coordinate value of a node that has not been positioned yet.
pub const UNPLACED: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorType {
    Under,
    Left,
    Right,
}

impl ConnectorType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "u" | "under" => Some(Self::Under),
            "l" | "left" => Some(Self::Left),
            "r" | "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Under => "under",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVAlign {
    Top,
    Middle,
    Bottom,
}

/// Parses a two letter alignment code such as `lm`, `ct` or `RB`.
pub fn parse_image_alignment(code: &str) -> (ImageAlign, ImageVAlign) {
    let mut chars = code.chars().map(|ch| ch.to_ascii_lowercase());
    let align = match chars.next() {
        Some('c') | Some('m') => ImageAlign::Center,
        Some('r') => ImageAlign::Right,
        _ => ImageAlign::Left,
    };
    let valign = match chars.next() {
        Some('t') => ImageVAlign::Top,
        Some('b') => ImageVAlign::Bottom,
        _ => ImageVAlign::Middle,
    };
    (align, valign)
}

#[derive(Debug, Clone)]
pub enum ImageState {
    /// Not requested from the host yet.
    Pending,
    /// Requested and waiting for its completion notice.
    Loading,
    Ready(ImageData),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct NodeImage {
    pub source: String,
    pub state: ImageState,
}

impl NodeImage {
    pub fn ready(&self) -> Option<&ImageData> {
        match &self.state {
            ImageState::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// Attributes of a node as handed over by the caller; anything left unset
/// is taken from the chart's style context when the node is added.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub id: Option<String>,
    pub parent: Option<String>,
    pub connector: Option<String>,
    pub text: String,
    pub bold: bool,
    pub url: Option<String>,
    pub border_color: Option<String>,
    pub fill_color: Option<String>,
    pub text_color: Option<String>,
    pub image: Option<String>,
    pub image_align: Option<String>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn connector(mut self, token: impl Into<String>) -> Self {
        self.connector = Some(token.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn colors(
        mut self,
        border: Option<&str>,
        fill: Option<&str>,
        text: Option<&str>,
    ) -> Self {
        self.border_color = border.map(str::to_string);
        self.fill_color = fill.map(str::to_string);
        self.text_color = text.map(str::to_string);
        self
    }

    pub fn image(mut self, source: impl Into<String>, align: Option<&str>) -> Self {
        self.image = Some(source.into());
        self.image_align = align.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub parent_id: Option<String>,
    pub parent: Option<usize>,
    pub connector: ConnectorType,
    pub text: String,
    pub bold: bool,
    pub url: String,
    pub border_color: String,
    pub fill_color: String,
    pub text_color: String,
    pub font: String,
    pub font_size: f32,
    pub v_centered: bool,
    pub image: Option<NodeImage>,
    pub image_align: ImageAlign,
    pub image_valign: ImageVAlign,
    pub top_radius: f32,
    pub bottom_radius: f32,
    pub shadow_offset: f32,
    pub x: f32,
    pub y: f32,
    pub placed: bool,
    pub under: Vec<usize>,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub image_drawn: bool,
}

impl Node {
    pub fn from_spec(spec: NodeSpec, style: &Style) -> Self {
        let text = spec.text;
        let id = spec
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| text.clone());
        let parent_id = spec.parent.filter(|parent| !parent.is_empty());
        let connector = match parent_id {
            None => ConnectorType::Under,
            Some(_) => spec
                .connector
                .as_deref()
                .and_then(ConnectorType::from_token)
                .unwrap_or(ConnectorType::Under),
        };
        let (image_align, image_valign) =
            parse_image_alignment(spec.image_align.as_deref().unwrap_or("lm"));
        let image = spec
            .image
            .filter(|source| !source.is_empty())
            .map(|source| NodeImage {
                source,
                state: ImageState::Pending,
            });
        let pick = |value: Option<String>, fallback: &str| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            id,
            parent_id,
            parent: None,
            connector,
            text,
            bold: spec.bold,
            url: spec.url.unwrap_or_default(),
            border_color: pick(spec.border_color, &style.box_line_color),
            fill_color: pick(spec.fill_color, &style.box_fill_color),
            text_color: pick(spec.text_color, &style.text_color),
            font: style.font.clone(),
            font_size: style.font_size,
            v_centered: style.v_centered,
            image,
            image_align,
            image_valign,
            top_radius: style.top_radius,
            bottom_radius: style.bottom_radius,
            shadow_offset: style.shadow_offset,
            x: UNPLACED,
            y: UNPLACED,
            placed: false,
            under: Vec::new(),
            left: Vec::new(),
            right: Vec::new(),
            image_drawn: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Connector used for layout; roots always behave as `Under`.
    pub fn kind(&self) -> ConnectorType {
        if self.parent.is_none() {
            ConnectorType::Under
        } else {
            self.connector
        }
    }

    pub fn place(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.placed = true;
    }

    /// Clears position and sibling links ahead of a full layout pass.
    pub fn reset(&mut self) {
        self.x = UNPLACED;
        self.y = UNPLACED;
        self.placed = false;
        self.parent = None;
        self.under.clear();
        self.left.clear();
        self.right.clear();
    }

    pub fn has_link(&self) -> bool {
        !self.url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_tokens_accept_short_and_long_forms() {
        assert_eq!(ConnectorType::from_token("u"), Some(ConnectorType::Under));
        assert_eq!(ConnectorType::from_token("L"), Some(ConnectorType::Left));
        assert_eq!(ConnectorType::from_token("right"), Some(ConnectorType::Right));
        assert_eq!(ConnectorType::from_token("x"), None);
    }

    #[test]
    fn alignment_codes_follow_letter_rules() {
        assert_eq!(
            parse_image_alignment("lm"),
            (ImageAlign::Left, ImageVAlign::Middle)
        );
        assert_eq!(
            parse_image_alignment("MT"),
            (ImageAlign::Center, ImageVAlign::Top)
        );
        assert_eq!(
            parse_image_alignment("rb"),
            (ImageAlign::Right, ImageVAlign::Bottom)
        );
        assert_eq!(
            parse_image_alignment("zz"),
            (ImageAlign::Left, ImageVAlign::Middle)
        );
        assert_eq!(
            parse_image_alignment(""),
            (ImageAlign::Left, ImageVAlign::Middle)
        );
    }

    #[test]
    fn spec_defaults_come_from_style() {
        let mut style = Style::classic();
        style.set_color(Some("#111111"), None, None, None);
        style.set_node_style(Some(0.0), None, Some(6.0));
        let node = Node::from_spec(NodeSpec::default().text("CEO"), &style);
        assert_eq!(node.id, "CEO");
        assert_eq!(node.border_color, "#111111");
        assert_eq!(node.fill_color, "#CFE8EF");
        assert_eq!(node.top_radius, 0.0);
        assert_eq!(node.shadow_offset, 6.0);
        assert!(!node.placed);
        assert_eq!(node.x, UNPLACED);
    }

    #[test]
    fn roots_and_invalid_connectors_become_under() {
        let style = Style::classic();
        let root = Node::from_spec(NodeSpec::new("a").connector("l"), &style);
        assert_eq!(root.connector, ConnectorType::Under);
        let child = Node::from_spec(NodeSpec::new("b").parent("a").connector("sideways"), &style);
        assert_eq!(child.connector, ConnectorType::Under);
        let lateral = Node::from_spec(NodeSpec::new("c").parent("a").connector("R"), &style);
        assert_eq!(lateral.connector, ConnectorType::Right);
    }
}
