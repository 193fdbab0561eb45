use crate::model::ConnectorType;

use super::query::Side;
use super::{Engine, same};

impl Engine<'_> {
    /// Re-centers every parent over its under-children, bottom-up per tree.
    pub(super) fn repos_parents(&mut self) {
        for root in self.roots() {
            self.repos_parent_tree(root);
        }
    }

    pub(super) fn repos_parent_tree(&mut self, p: usize) {
        let children: Vec<usize> = crate::tree::children(self.nodes, p).collect();
        for child in children {
            self.repos_parent_tree(child);
        }
        self.repos_parent(p);
    }

    fn repos_parent(&mut self, p: usize) {
        let geo = self.geo;
        let node = &self.nodes[p];
        let count = node.under.len();
        if count == 0 {
            return;
        }
        let px = node.x;
        let py = node.y;

        // A lateral sibling must keep clear of its parent's downline.
        let max_w = match (node.kind(), node.parent) {
            (ConnectorType::Left | ConnectorType::Right, Some(parent)) => {
                Some(self.nodes[parent].x + geo.box_width / 2.0 - geo.pitch() - px)
            }
            _ => None,
        };

        let mut w = if self.center_over_subtree {
            (self.right_most(p, f32::INFINITY).unwrap_or(px) - px) / 2.0
        } else {
            // Midpoint of the first row, which is the row the yoke spans.
            let first = node.under[0];
            let on_first_row = if self.per_row > 0 {
                count.min(self.per_row)
            } else {
                count
            };
            let last = node.under[on_first_row - 1];
            let (fx, lx) = (self.nodes[first].x, self.nodes[last].x);
            fx + (lx - fx) / 2.0 - px
        };
        if let Some(max_w) = max_w.filter(|max_w| *max_w >= 0.0) {
            w = w.min(max_w);
        }
        if let Some(next) = self.node_on_line(py, px, Side::Right) {
            let next_x = self.nodes[next].x;
            if px + geo.pitch() + w >= next_x {
                w = next_x - geo.pitch() - px;
            }
        }
        if count == 1 {
            w = self.nodes[self.nodes[p].under[0]].x - px;
        }
        // Stay clear of connector lines to nodes further right on this row.
        for other in self.nodes.iter() {
            if other.placed && same(other.y, py) && other.x > px {
                let room = (other.x - px - geo.box_width - geo.h_shift - geo.h_space).max(0.0);
                w = w.min(room);
            }
        }

        if w > 1.0 {
            self.nodes[p].x += w;
            let lateral: Vec<usize> = self.nodes[p]
                .left
                .iter()
                .chain(&self.nodes[p].right)
                .copied()
                .collect();
            for s in lateral {
                self.shift_tree(s, w);
            }
        }
    }
}
