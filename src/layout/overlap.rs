use log::trace;

use crate::model::ConnectorType;
use crate::tree;

use super::{Engine, same};

impl Engine<'_> {
    /// Final sweep over all pairs: first boxes on exactly the same spot,
    /// then boxes that overlap a neighbour on their left.
    pub(super) fn check_overlap(&mut self) {
        self.separate_duplicates();
        self.separate_overlaps();
    }

    fn separate_duplicates(&mut self) {
        let pitch = self.geo.pitch();
        for _ in 0..self.retry_limit {
            let mut changed = false;
            for i in 0..self.nodes.len() {
                for j in i + 1..self.nodes.len() {
                    let (a, b) = (&self.nodes[i], &self.nodes[j]);
                    if !(a.placed && b.placed && same(a.x, b.x) && same(a.y, b.y)) {
                        continue;
                    }
                    changed = true;
                    let (ri, rj) = (tree::root_of(self.nodes, i), tree::root_of(self.nodes, j));
                    if ri != rj {
                        self.shift_with_right(rj, pitch);
                        continue;
                    }
                    let uj = tree::under_parent(self.nodes, j);
                    if tree::under_parent(self.nodes, i) != uj {
                        self.shift_with_right(uj, pitch);
                        continue;
                    }
                    let mut top = j;
                    while let Some(parent) = self.nodes[top].parent {
                        if matches!(
                            self.nodes[top].kind(),
                            ConnectorType::Under | ConnectorType::Right
                        ) {
                            break;
                        }
                        top = parent;
                    }
                    if !self.nodes[top].is_root() {
                        self.shift_with_right(top, pitch);
                    }
                }
            }
            if !changed {
                return;
            }
        }
        trace!("duplicate positions remain after {} sweeps", self.retry_limit);
    }

    fn separate_overlaps(&mut self) {
        let geo = self.geo;
        for _ in 0..self.retry_limit {
            let mut changed = false;
            for i in 0..self.nodes.len() {
                if !self.nodes[i].placed {
                    continue;
                }
                let Some(j) = self.overlap_on_left(i) else {
                    continue;
                };
                changed = true;
                let mut ui = tree::under_parent(self.nodes, i);
                let uj = tree::under_parent(self.nodes, j);
                if ui == uj {
                    self.shift_with_right(i, geo.box_width / 2.0);
                    continue;
                }
                let w = self.nodes[j].x - self.nodes[i].x + geo.pitch();
                if tree::is_within(self.nodes, j, ui) {
                    // Both sit below the same under-node: move the first
                    // ancestor of `i` that hangs off a different side.
                    let kind = self.nodes[i].kind();
                    let mut k = Some(i);
                    while let Some(idx) = k {
                        if self.nodes[idx].kind() != kind {
                            break;
                        }
                        k = self.nodes[idx].parent;
                    }
                    if let Some(k) = k {
                        self.shift_with_right(k, w);
                    }
                } else {
                    while let Some(parent) = self.nodes[ui].parent {
                        if self.nodes[ui].kind() != ConnectorType::Under
                            || self.nodes[parent].under.len() != 1
                        {
                            break;
                        }
                        ui = parent;
                    }
                    self.shift_with_right(ui, w);
                }
            }
            if !changed {
                return;
            }
        }
        let remaining = (0..self.nodes.len())
            .any(|i| self.nodes[i].placed && self.overlap_on_left(i).is_some());
        if remaining {
            trace!("overlapping boxes remain after {} sweeps", self.retry_limit);
        }
    }
}
