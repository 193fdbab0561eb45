mod align;
mod center;
mod lines;
mod overlap;
mod place;
mod query;

pub use align::{Align, align_nodes};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::Node;
use crate::style::Style;

/// Upper bound on repair iterations of every collision loop.
pub const DEFAULT_RETRY_LIMIT: usize = 9;

/// Probe distance used by the overlap detection around a box edge.
const PROBE: f32 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub retry_limit: usize,
    /// Center a parent over the whole subtree instead of over the midpoint
    /// of its first and last under-child.
    pub center_over_subtree: bool,
    /// Fixed number of under-children per row; derived from the surface
    /// width when unset.
    pub row_capacity: Option<usize>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            retry_limit: DEFAULT_RETRY_LIMIT,
            center_over_subtree: false,
            row_capacity: None,
        }
    }
}

/// Box size and spacing shared by every node of a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub box_width: f32,
    pub box_height: f32,
    pub h_space: f32,
    pub v_space: f32,
    pub h_shift: f32,
}

impl Geometry {
    pub fn from_style(style: &Style) -> Self {
        Self {
            box_width: style.box_width,
            box_height: style.box_height,
            h_space: style.h_space,
            v_space: style.v_space,
            h_shift: style.h_shift,
        }
    }

    /// Horizontal distance between two adjacent boxes on a row.
    pub fn pitch(&self) -> f32 {
        self.box_width + self.h_space
    }

    /// Under-children that fit on one row of a surface `width` pixels wide.
    pub fn row_capacity(&self, width: f32) -> usize {
        (((width + self.h_space) / self.pitch()).floor() as usize).max(1)
    }
}

/// Result of a layout pass that the renderer needs to draw connectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSummary {
    /// Row capacity used for wrapping; 0 means unlimited.
    pub per_row: usize,
}

/// Positions every node of an already resolved forest.
///
/// `surface_width` is the drawing width in pixels, or `None` when the width
/// follows the chart. Positions are reset-independent: the passes only read
/// positions they assigned themselves.
pub fn compute_positions(
    nodes: &mut [Node],
    geometry: Geometry,
    options: &LayoutOptions,
    surface_width: Option<f32>,
) -> LayoutSummary {
    let per_row = options
        .row_capacity
        .map(|cap| cap.max(1))
        .or_else(|| surface_width.map(|width| geometry.row_capacity(width)))
        .unwrap_or(0);
    debug!(
        "layout: {} nodes, surface width {:?}, {} per row",
        nodes.len(),
        surface_width,
        per_row
    );

    let mut engine = Engine {
        nodes,
        geo: geometry,
        retry_limit: options.retry_limit,
        center_over_subtree: options.center_over_subtree,
        per_row,
        surface_width: surface_width.unwrap_or(f32::INFINITY),
    };
    engine.position_roots();
    engine.check_lines();
    engine.repos_parents();
    engine.check_overlap();

    LayoutSummary { per_row }
}

/// Mutable view over the node arena while the passes run.
struct Engine<'a> {
    nodes: &'a mut [Node],
    geo: Geometry,
    retry_limit: usize,
    center_over_subtree: bool,
    per_row: usize,
    surface_width: f32,
}

/// Coordinates closer than this are treated as equal.
pub(crate) fn same(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

pub(crate) use query::{end_of_downline, node_at};
