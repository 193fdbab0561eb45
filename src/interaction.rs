use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::chart::Chart;
use crate::document::Document;
use crate::layout::{Geometry, node_at};
use crate::model::Node;

/// A scheme before the first slash marks a link that opens in a new view.
static EXTERNAL_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^/]*://").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Auxiliary,
    Secondary,
}

/// What the host should do after a click on a linked node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    OpenNewView(String),
    NavigateCurrent(String),
}

impl Navigation {
    pub fn for_url(url: &str) -> Self {
        if EXTERNAL_LINK.is_match(url) {
            Self::OpenNewView(url.to_string())
        } else {
            Self::NavigateCurrent(url.to_string())
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::OpenNewView(url) | Self::NavigateCurrent(url) => url,
        }
    }
}

/// Index of the node under the pointer. The first node in insertion order
/// wins when boxes coincide.
pub fn hit_test(nodes: &[Node], geometry: &Geometry, x: f32, y: f32) -> Option<usize> {
    node_at(nodes, geometry, x, y)
}

pub fn cursor_at(nodes: &[Node], geometry: &Geometry, x: f32, y: f32) -> Cursor {
    match hit_test(nodes, geometry, x, y) {
        Some(idx) if nodes[idx].has_link() => Cursor::Pointer,
        _ => Cursor::Default,
    }
}

pub fn click_at(
    nodes: &[Node],
    geometry: &Geometry,
    x: f32,
    y: f32,
    button: MouseButton,
) -> Option<Navigation> {
    if button != MouseButton::Primary {
        return None;
    }
    let idx = hit_test(nodes, geometry, x, y)?;
    let node = &nodes[idx];
    node.has_link().then(|| Navigation::for_url(&node.url))
}

/// Runs a full draw again for every chart whose width follows its
/// container. A chart that fails reports on its own and the rest continue.
/// Returns the number of charts drawn.
pub fn relayout_on_resize(charts: &mut [Chart], doc: &mut Document) -> usize {
    let mut drawn = 0;
    for chart in charts.iter_mut().filter(|chart| chart.is_container_bound()) {
        if chart.handle_resize(doc).is_ok() {
            drawn += 1;
        }
    }
    debug!("resize: {drawn} charts drawn again");
    drawn
}
