use log::trace;

use crate::model::ConnectorType;
use crate::tree;

use super::Engine;
use super::query::{Branches, Side};

impl Engine<'_> {
    /// Places the roots along rows of the surface and lays out each tree
    /// right after its root.
    pub(super) fn position_roots(&mut self) {
        let geo = self.geo;
        let mut x = 0.0f32;
        let mut y = 0.0f32;
        let mut row: Vec<usize> = Vec::new();

        for root in self.roots() {
            let shadow = self.nodes[root].shadow_offset;
            if x + shadow + geo.box_width > self.surface_width && !row.is_empty() {
                let bottom = row
                    .iter()
                    .map(|&idx| self.lowest_box(idx, Branches::ALL))
                    .fold(y, f32::max);
                x = 0.0;
                y = bottom + geo.box_height + geo.v_space * 2.0;
                row.clear();
            }
            self.nodes[root].place(x + shadow, y + shadow);
            self.position_tree(root);
            row.push(root);
            let right = self
                .right_most(root, f32::INFINITY)
                .unwrap_or(self.nodes[root].x);
            x = right + geo.pitch();
        }
    }

    /// Lays out the left siblings, right siblings and under-children of an
    /// already placed node `p`, recursively.
    pub(super) fn position_tree(&mut self, p: usize) {
        self.position_left(p);
        self.position_right(p);
        self.clear_downline(p);
        self.position_under(p);
        self.repos_parent_tree(p);
    }

    fn position_left(&mut self, p: usize) {
        let geo = self.geo;
        let left = self.nodes[p].left.clone();
        for s in left {
            let y = self.lowest_box(p, Branches::LEFT) + geo.box_height + geo.v_space;
            let x = self.nodes[p].x - geo.box_width / 2.0 - geo.h_shift;
            self.nodes[s].place(x, y);
            if x < 0.0 {
                for root in self.roots() {
                    self.shift_tree(root, -x);
                }
                self.nodes[s].x = 0.0;
            }
            self.settle(s, self.retry_limit, Self::repair_lateral_left);
            self.position_tree(s);
        }
    }

    fn position_right(&mut self, p: usize) {
        let geo = self.geo;
        let right = self.nodes[p].right.clone();
        for s in right {
            let y = self.lowest_box(p, Branches::RIGHT) + geo.box_height + geo.v_space;
            let x = self.nodes[p].x + geo.box_width / 2.0 + geo.h_shift;
            self.nodes[s].place(x, y);
            self.settle(s, self.retry_limit, Self::repair_lateral_right);
            self.position_tree(s);
        }
    }

    /// Keeps lateral subtrees off the vertical line below `p`.
    fn clear_downline(&mut self, p: usize) {
        let geo = self.geo;
        let Some(end) = self.end_of_downline(p).filter(|end| *end > 0.0) else {
            return;
        };
        let left = self.nodes[p].left.clone();
        let right = self.nodes[p].right.clone();

        if let Some(max_x) = left
            .iter()
            .filter_map(|&l| self.right_most(l, end))
            .reduce(f32::max)
        {
            let w = max_x + geo.box_width / 2.0 + geo.h_shift - self.nodes[p].x;
            if w > 0.0 {
                self.nodes[p].x += w;
                let line = self.nodes[p].x + geo.box_width / 2.0;
                for &r in &right {
                    if self.left_most(r, end).is_some_and(|min_x| min_x <= line) {
                        self.shift_tree(r, w);
                    }
                }
            }
        }

        if let Some(min_x) = right
            .iter()
            .filter_map(|&r| self.left_most(r, end))
            .reduce(f32::min)
        {
            let w = self.nodes[p].x + geo.box_width / 2.0 + geo.h_shift - min_x;
            if w > 0.0 {
                for &r in &right {
                    self.shift_tree(r, w);
                }
            }
        }
    }

    fn position_under(&mut self, p: usize) {
        let geo = self.geo;
        let under = self.nodes[p].under.clone();
        let count = under.len();
        if count == 0 {
            return;
        }
        let left = self.nodes[p].left.clone();
        let right = self.nodes[p].right.clone();
        let row_y = self.lowest_box(p, Branches::LATERAL) + geo.box_height + geo.v_space;

        // Start right of the left trees; the gap differs when right trees exist.
        let mut max_x = 0.0f32;
        if !left.is_empty() {
            max_x = left
                .iter()
                .filter_map(|&l| self.right_most(l, row_y))
                .fold(0.0, f32::max)
                + geo.box_width;
        }
        let gap = if right.is_empty() {
            geo.h_shift / 2.0
        } else {
            geo.h_space / 2.0
        };
        let w = max_x + gap - geo.box_width / 2.0 - self.nodes[p].x;
        if w > 0.0 {
            self.nodes[p].x += w;
        }
        for &r in &right {
            if let Some(min_x) = self.left_most(r, row_y) {
                let w = self.nodes[p].x + geo.box_width / 2.0 + geo.h_shift / 2.0 - min_x;
                if w > 0.0 {
                    self.shift_tree(r, w);
                }
            }
        }

        // Center the first row under the parent, but never left of the
        // nearest node already on that row.
        let parent_x = self.nodes[p].x;
        let mut x1 = parent_x;
        let mut x2 = parent_x;
        if count >= 2 && x1 > 0.0 {
            let on_row = if self.per_row > 0 {
                count.min(self.per_row)
            } else {
                count
            };
            let total = on_row as f32 * geo.box_width + (on_row as f32 - 1.0) * geo.h_space;
            let centered = parent_x + geo.box_width / 2.0 - total / 2.0;
            match self.node_on_line(row_y, parent_x, Side::Left) {
                None => {
                    x2 = centered.max(0.0);
                    x1 = x2;
                }
                Some(h) if self.nodes[h].x + geo.pitch() < x1 => {
                    let start = (self.nodes[h].x + geo.pitch()).max(centered);
                    x1 = start;
                    x2 = start;
                }
                Some(_) => {}
            }
        }

        for (k, s) in under.into_iter().enumerate() {
            if self.per_row > 0 && k >= self.per_row {
                let row = (k / self.per_row) as f32;
                self.nodes[s].place(x1, row_y + (geo.box_height + geo.v_space) * row);
            } else {
                self.nodes[s].place(x2, row_y);
            }
            self.settle(s, self.retry_limit + 1, Self::repair_under);
            self.position_tree(s);
            x2 = self.nodes[s].x + geo.pitch();
        }
    }

    /// Runs the collision check for `s` and applies `repair` until the node
    /// is free or `attempts` run out.
    fn settle(&mut self, s: usize, attempts: usize, repair: fn(&mut Self, usize, usize)) {
        for _ in 0..attempts {
            let Some(other) = self.collision(s) else {
                return;
            };
            repair(self, s, other);
        }
        if self.collision(s).is_some() {
            trace!("node '{}' still collides after {attempts} repairs", self.nodes[s].id);
        }
    }

    fn repair_lateral_left(&mut self, s: usize, other: usize) {
        let geo = self.geo;
        let mut w = self.nodes[other].x + geo.pitch() - self.nodes[s].x;
        if self.nodes[other].kind() == ConnectorType::Left {
            w += geo.h_space;
        }
        let Some(parent) = self.nodes[s].parent else {
            return;
        };
        let q = tree::under_parent(self.nodes, parent);
        if !tree::is_within(self.nodes, other, q) {
            self.shift_with_right(q, w);
        }
    }

    fn repair_lateral_right(&mut self, s: usize, other: usize) {
        let geo = self.geo;
        let Some(parent) = self.nodes[s].parent else {
            return;
        };
        let h = (self.nodes[s].x - self.nodes[other].x).abs();
        let q = tree::under_parent(self.nodes, parent);
        if tree::under_parent(self.nodes, s) == tree::under_parent(self.nodes, other) {
            if !tree::is_within(self.nodes, other, q) {
                self.shift_with_right(q, geo.pitch() - h);
            }
            return;
        }
        let w = self.nodes[other].x - self.nodes[s].x + geo.pitch();
        if tree::root_of(self.nodes, s) == tree::root_of(self.nodes, other) {
            let top = self.highest_apart(s, other);
            self.shift_with_right(top, w);
        } else {
            self.shift_with_right(s, w);
        }
    }

    fn repair_under(&mut self, s: usize, other: usize) {
        let w = self.nodes[other].x - self.nodes[s].x + self.geo.pitch();
        let top = self.highest_apart(s, other);
        self.shift_with_right(top, w);
    }

    /// Highest ancestor of `s` whose parent does not contain `other`.
    fn highest_apart(&self, s: usize, other: usize) -> usize {
        let mut top = s;
        while let Some(parent) = self.nodes[top].parent {
            if tree::is_within(self.nodes, other, parent) {
                break;
            }
            top = parent;
        }
        top
    }
}
