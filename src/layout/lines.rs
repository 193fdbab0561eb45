use log::trace;

use crate::model::ConnectorType;
use crate::tree;

use super::Engine;

impl Engine<'_> {
    /// Walks every downline from top to bottom and pushes aside any box
    /// the line would cross.
    pub(super) fn check_lines(&mut self) {
        for root in self.roots() {
            self.check_lines_tree(root);
        }
    }

    fn check_lines_tree(&mut self, p: usize) {
        let geo = self.geo;
        let node = &self.nodes[p];
        let mut end = 0.0f32;
        if let Some(&last) = node.left.last() {
            end = self.nodes[last].y + geo.box_height / 2.0;
        }
        if let Some(&last) = node.right.last() {
            end = end.max(self.nodes[last].y + geo.box_height / 2.0);
        }
        if let Some(&first) = node.under.first() {
            end = self.nodes[first].y - geo.v_space / 2.0;
        }

        if end > 0.0 {
            let step = geo.box_height + geo.v_space;
            let mut y = self.nodes[p].y + geo.box_height / 2.0 + step;
            while y <= end {
                self.clear_line_at(p, y);
                y += step;
            }
        }

        let children: Vec<usize> = tree::children(self.nodes, p).collect();
        for child in children {
            self.check_lines_tree(child);
        }
    }

    /// Box crossed by the downline of `p` at height `y`.
    fn line_crossing(&self, p: usize, y: f32) -> Option<usize> {
        self.node_at(self.nodes[p].x + self.geo.box_width / 2.0 - super::PROBE, y)
    }

    /// Pushes boxes off the downline of `p` at height `y`. Returns false
    /// when the line still crosses a box once the retries are used up.
    fn clear_line_at(&mut self, p: usize, y: f32) -> bool {
        let geo = self.geo;
        for _ in 0..self.retry_limit {
            let line_x = self.nodes[p].x + geo.box_width / 2.0;
            let Some(s) = self.line_crossing(p, y) else {
                return true;
            };
            let w = self.nodes[s].x + geo.pitch() - line_x;
            if !tree::is_within(self.nodes, s, p) {
                // The crossed box belongs to another branch: move whichever
                // side lies to the right.
                let mut rs = s;
                while let Some(parent) = self.nodes[rs].parent {
                    if self.nodes[rs].y <= self.nodes[p].y {
                        break;
                    }
                    rs = parent;
                }
                if self.nodes[rs].x > self.nodes[p].x {
                    let w = line_x + geo.h_space - self.nodes[s].x;
                    self.shift_with_right(rs, w);
                } else {
                    let rp = tree::under_parent(self.nodes, p);
                    self.shift_with_right(rp, w);
                }
            } else {
                let mut branch = s;
                while let Some(parent) = self.nodes[branch].parent {
                    if parent == p {
                        break;
                    }
                    branch = parent;
                }
                if self.nodes[branch].kind() == ConnectorType::Left {
                    self.shift_with_right(p, w);
                    self.shift_tree(branch, -w);
                } else {
                    let w = line_x - self.nodes[s].x + geo.h_space;
                    self.shift_with_right(branch, w);
                }
            }
        }
        let clear = self.line_crossing(p, y).is_none();
        if !clear {
            trace!(
                "downline of '{}' still crosses a box at y {y}",
                self.nodes[p].id
            );
        }
        clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::testing::{forest, laid_out};
    use crate::layout::{Geometry, node_at};
    use crate::model::NodeSpec;
    use crate::style::Style;

    #[test]
    fn last_retry_that_clears_the_line_counts_as_clear() {
        let mut nodes = forest(vec![
            NodeSpec::new("P"),
            NodeSpec::new("C").parent("P"),
            NodeSpec::new("Q"),
        ]);
        nodes[0].place(0.0, 0.0);
        nodes[1].place(0.0, 100.0);
        nodes[2].place(0.0, 50.0);
        let mut engine = Engine {
            nodes: &mut nodes,
            geo: Geometry::from_style(&Style::classic()),
            retry_limit: 1,
            center_over_subtree: false,
            per_row: 0,
            surface_width: f32::INFINITY,
        };
        assert_eq!(engine.line_crossing(0, 65.0), Some(2));
        assert!(engine.clear_line_at(0, 65.0));
        assert_eq!(engine.line_crossing(0, 65.0), None);
        assert!((nodes[0].x - 80.0).abs() < 1e-3);
        assert!((nodes[1].x - 80.0).abs() < 1e-3);
        assert!((nodes[2].x - 0.0).abs() < 1e-3);
    }

    #[test]
    fn exhausted_retries_report_a_crossing() {
        let mut nodes = forest(vec![NodeSpec::new("P"), NodeSpec::new("Q")]);
        nodes[0].place(0.0, 0.0);
        nodes[1].place(0.0, 50.0);
        let mut engine = Engine {
            nodes: &mut nodes,
            geo: Geometry::from_style(&Style::classic()),
            retry_limit: 0,
            center_over_subtree: false,
            per_row: 0,
            surface_width: f32::INFINITY,
        };
        assert!(!engine.clear_line_at(0, 65.0));
    }

    #[test]
    fn downline_does_not_cross_left_subtree() {
        let nodes = laid_out(
            vec![
                NodeSpec::new("R"),
                NodeSpec::new("L").parent("R").connector("l"),
                NodeSpec::new("L1").parent("L"),
                NodeSpec::new("L2").parent("L"),
                NodeSpec::new("C").parent("R"),
            ],
            Some(1201.0),
        );
        let geo = Geometry::from_style(&Style::classic());
        let r = &nodes[0];
        let line_x = r.x + geo.box_width / 2.0;
        let end = nodes[4].y - geo.v_space / 2.0;
        let mut y = r.y + geo.box_height;
        while y < end {
            if let Some(hit) = node_at(&nodes, &geo, line_x, y) {
                panic!("downline crosses node {hit} at y {y}");
            }
            y += 1.0;
        }
    }
}
