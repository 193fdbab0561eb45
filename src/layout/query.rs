use crate::model::Node;
use crate::tree;

use super::{Engine, Geometry, same};

/// Which child lists of a node a vertical extent is taken over.
#[derive(Debug, Clone, Copy)]
pub(super) struct Branches {
    under: bool,
    left: bool,
    right: bool,
}

impl Branches {
    pub(super) const ALL: Self = Self {
        under: true,
        left: true,
        right: true,
    };
    pub(super) const LEFT: Self = Self {
        under: false,
        left: true,
        right: false,
    };
    pub(super) const RIGHT: Self = Self {
        under: false,
        left: false,
        right: true,
    };
    pub(super) const LATERAL: Self = Self {
        under: false,
        left: true,
        right: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Side {
    Left,
    Right,
}

/// First placed node whose box contains `(x, y)`, edges excluded.
pub(crate) fn node_at(nodes: &[Node], geo: &Geometry, x: f32, y: f32) -> Option<usize> {
    hit(nodes, geo, x, y, None)
}

fn hit(nodes: &[Node], geo: &Geometry, x: f32, y: f32, skip: Option<usize>) -> Option<usize> {
    let x2 = x - geo.box_width;
    let y2 = y - geo.box_height;
    nodes.iter().enumerate().position(|(idx, node)| {
        Some(idx) != skip && node.placed && x > node.x && x2 < node.x && y > node.y && y2 < node.y
    })
}

/// End point of the vertical line below `p`: just above the first
/// under-child, otherwise the middle of the lowest lateral sibling.
pub(crate) fn end_of_downline(nodes: &[Node], geo: &Geometry, p: usize) -> Option<f32> {
    let node = &nodes[p];
    if let Some(&first) = node.under.first() {
        let first = &nodes[first];
        return first.placed.then(|| first.y - geo.v_space / 2.0);
    }
    let last = match (node.left.last(), node.right.last()) {
        (Some(&l), Some(&r)) => {
            if nodes[l].y > nodes[r].y {
                l
            } else {
                r
            }
        }
        (Some(&l), None) => l,
        (None, Some(&r)) => r,
        (None, None) => return None,
    };
    Some(nodes[last].y + geo.box_height / 2.0)
}

impl Engine<'_> {
    pub(super) fn node_at(&self, x: f32, y: f32) -> Option<usize> {
        hit(self.nodes, &self.geo, x, y, None)
    }

    pub(super) fn node_at_except(&self, x: f32, y: f32, skip: usize) -> Option<usize> {
        hit(self.nodes, &self.geo, x, y, Some(skip))
    }

    /// Nearest node on row `y` left of `x` (rightmost such node) or right
    /// of `x` (leftmost such node).
    pub(super) fn node_on_line(&self, y: f32, x: f32, side: Side) -> Option<usize> {
        let mut found: Option<(usize, f32)> = None;
        for (idx, node) in self.nodes.iter().enumerate() {
            if !node.placed || !same(node.y, y) {
                continue;
            }
            let better = match (side, found) {
                (Side::Left, None) => node.x < x,
                (Side::Left, Some((_, best))) => node.x < x && node.x > best,
                (Side::Right, None) => node.x > x,
                (Side::Right, Some((_, best))) => node.x > x && node.x < best,
            };
            if better {
                found = Some((idx, node.x));
            }
        }
        found.map(|(idx, _)| idx)
    }

    /// Largest x in the subtree of `p`, counting only nodes at or above `max_y`.
    pub(super) fn right_most(&self, p: usize, max_y: f32) -> Option<f32> {
        let node = &self.nodes[p];
        let own = (node.y <= max_y).then_some(node.x);
        tree::children(self.nodes, p)
            .filter_map(|child| self.right_most(child, max_y))
            .chain(own)
            .reduce(f32::max)
    }

    /// Smallest x in the subtree of `p`. Of the under-children only the
    /// first is followed, since the rest lie to its right.
    pub(super) fn left_most(&self, p: usize, max_y: f32) -> Option<f32> {
        let node = &self.nodes[p];
        let own = (node.y <= max_y).then_some(node.x);
        node.under
            .first()
            .into_iter()
            .chain(node.left.iter())
            .chain(node.right.iter())
            .filter_map(|&child| self.left_most(child, max_y))
            .chain(own)
            .reduce(f32::min)
    }

    /// Lowest y of `p` and the complete subtrees of the selected branches.
    pub(super) fn lowest_box(&self, p: usize, branches: Branches) -> f32 {
        let node = &self.nodes[p];
        let mut lists: Vec<&[usize]> = Vec::with_capacity(3);
        if branches.under {
            lists.push(&node.under);
        }
        if branches.left {
            lists.push(&node.left);
        }
        if branches.right {
            lists.push(&node.right);
        }
        lists
            .into_iter()
            .flatten()
            .map(|&child| self.lowest_box(child, Branches::ALL))
            .fold(node.y, f32::max)
    }

    pub(super) fn end_of_downline(&self, p: usize) -> Option<f32> {
        end_of_downline(self.nodes, &self.geo, p)
    }

    /// Moves every placed node of the subtree of `p` by `w`.
    pub(super) fn shift_tree(&mut self, p: usize, w: f32) {
        let mut stack = vec![p];
        while let Some(idx) = stack.pop() {
            let node = &mut self.nodes[idx];
            if node.placed {
                node.x += w;
            }
            stack.extend(node.under.iter().chain(&node.left).chain(&node.right).copied());
        }
    }

    /// Shifts `p` right together with everything that must stay right of
    /// it: its later under-brothers, and for under-type nodes every root
    /// tree that starts right of its own root.
    pub(super) fn shift_with_right(&mut self, p: usize, w: f32) {
        let root = tree::root_of(self.nodes, p);
        let root_x = self.nodes[root].x;
        let under_type = self.nodes[p].kind() == crate::model::ConnectorType::Under;

        match self.nodes[p].parent {
            Some(parent) if under_type => {
                let brothers = self.nodes[parent].under.clone();
                for &brother in brothers.iter().rev() {
                    self.shift_tree(brother, w);
                    if brother == p {
                        break;
                    }
                }
            }
            _ => self.shift_tree(p, w),
        }

        if under_type {
            for idx in 0..self.nodes.len() {
                let node = &self.nodes[idx];
                if idx != root && node.is_root() && node.placed && node.x > root_x {
                    self.shift_tree(idx, w);
                }
            }
        }
    }

    /// First node already placed that collides with `s`: a box at its left
    /// or right edge, or any node further right on the same row.
    pub(super) fn collision(&self, s: usize) -> Option<usize> {
        let node = &self.nodes[s];
        let probe_y = node.y + super::PROBE;
        self.node_at_except(node.x - super::PROBE, probe_y, s)
            .or_else(|| self.node_at_except(node.x + self.geo.box_width + super::PROBE, probe_y, s))
            .or_else(|| {
                self.node_on_line(node.y, f32::INFINITY, Side::Left)
                    .filter(|&other| other != s)
            })
    }

    /// First placed node whose box intersects the box of `s` from the
    /// left. At equal x the earlier node counts as the left one.
    pub(super) fn overlap_on_left(&self, s: usize) -> Option<usize> {
        let node = &self.nodes[s];
        let geo = &self.geo;
        self.nodes.iter().enumerate().position(|(idx, other)| {
            idx != s
                && other.placed
                && (other.x < node.x || (other.x <= node.x && idx < s))
                && node.x < other.x + geo.box_width
                && (node.y - other.y).abs() < geo.box_height
        })
    }

    pub(super) fn roots(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_root())
            .map(|(idx, _)| idx)
            .collect()
    }
}
