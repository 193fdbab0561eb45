use serde::{Deserialize, Serialize};

use crate::model::Node;

/// Horizontal placement of the finished drawing on its surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
}

impl Align {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "c" | "center" => Self::Center,
            _ => Self::Left,
        }
    }
}

/// Shifts all nodes so the drawing starts at x = 0, or so it is centered on
/// a surface `surface_width` pixels wide. Without a known width centering
/// falls back to left alignment.
pub fn align_nodes(nodes: &mut [Node], box_width: f32, align: Align, surface_width: Option<f32>) {
    let mut placed = nodes.iter().filter(|node| node.placed).map(|node| node.x);
    let Some(first) = placed.next() else {
        return;
    };
    let (min, max) = placed.fold((first, first), |(min, max), x| (min.min(x), max.max(x)));

    let shift = match (align, surface_width) {
        (Align::Center, Some(width)) => (width - (max + box_width - min)) / 2.0 - min,
        _ => -min,
    };
    if shift == 0.0 {
        return;
    }
    for node in nodes.iter_mut().filter(|node| node.placed) {
        node.x += shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::testing::forest;
    use crate::model::NodeSpec;

    fn row() -> Vec<Node> {
        let mut nodes = forest(vec![NodeSpec::new("a"), NodeSpec::new("b")]);
        nodes[0].place(20.0, 3.0);
        nodes[1].place(160.0, 3.0);
        nodes
    }

    #[test]
    fn left_alignment_moves_leftmost_to_zero() {
        let mut nodes = row();
        align_nodes(&mut nodes, 120.0, Align::Left, Some(801.0));
        assert!((nodes[0].x - 0.0).abs() < 1e-3);
        assert!((nodes[1].x - 140.0).abs() < 1e-3);
    }

    #[test]
    fn center_alignment_splits_free_space() {
        let mut nodes = row();
        align_nodes(&mut nodes, 120.0, Align::Center, Some(600.0));
        // Occupied width is 260, so 170px remain on each side.
        assert!((nodes[0].x - 170.0).abs() < 1e-3);
        assert!((nodes[1].x - 310.0).abs() < 1e-3);
    }

    #[test]
    fn center_without_width_is_left() {
        let mut nodes = row();
        align_nodes(&mut nodes, 120.0, Align::Center, None);
        assert!((nodes[0].x - 0.0).abs() < 1e-3);
    }

    #[test]
    fn align_tokens() {
        assert_eq!(Align::from_token("c"), Align::Center);
        assert_eq!(Align::from_token("Center"), Align::Center);
        assert_eq!(Align::from_token("l"), Align::Left);
        assert_eq!(Align::from_token("whatever"), Align::Left);
    }
}
