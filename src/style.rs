use serde::{Deserialize, Serialize};

/// Global style context of one chart.
///
/// Every value is captured into a node when it is added, so changing the
/// context afterwards only affects nodes added later. Box geometry and the
/// connector line color are read at layout and paint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub line_color: String,
    pub box_width: f32,
    pub box_height: f32,
    pub h_space: f32,
    pub v_space: f32,
    pub h_shift: f32,
    pub box_line_color: String,
    pub box_fill_color: String,
    pub text_color: String,
    pub font: String,
    pub font_size: f32,
    pub v_centered: bool,
    pub top_radius: f32,
    pub bottom_radius: f32,
    pub shadow_offset: f32,
    pub shadow_color: String,
}

/// Smallest spacing accepted by [`Style::set_size`].
const MIN_SPACING: f32 = 3.0;

impl Style {
    pub fn classic() -> Self {
        Self {
            line_color: "#3388DD".to_string(),
            box_width: 120.0,
            box_height: 30.0,
            h_space: 20.0,
            v_space: 20.0,
            h_shift: 30.0,
            box_line_color: "#B5D9EA".to_string(),
            box_fill_color: "#CFE8EF".to_string(),
            text_color: "#000000".to_string(),
            font: "arial".to_string(),
            font_size: 12.0,
            v_centered: true,
            top_radius: 5.0,
            bottom_radius: 5.0,
            shadow_offset: 3.0,
            shadow_color: "#A1A1A1".to_string(),
        }
    }

    /// Box size and spacing. Absent or non-positive values leave the current
    /// setting untouched.
    pub fn set_size(
        &mut self,
        width: Option<f32>,
        height: Option<f32>,
        h_space: Option<f32>,
        v_space: Option<f32>,
        h_shift: Option<f32>,
    ) {
        if let Some(value) = positive(width) {
            self.box_width = value;
        }
        if let Some(value) = positive(height) {
            self.box_height = value;
        }
        if let Some(value) = positive(h_space) {
            self.h_space = value.max(MIN_SPACING);
        }
        if let Some(value) = positive(v_space) {
            self.v_space = value.max(MIN_SPACING);
        }
        if let Some(value) = positive(h_shift) {
            self.h_shift = value.max(MIN_SPACING);
        }
    }

    /// Corner radii and shadow offset; zero is allowed, negative is ignored.
    pub fn set_node_style(&mut self, top: Option<f32>, bottom: Option<f32>, shadow: Option<f32>) {
        if let Some(value) = non_negative(top) {
            self.top_radius = value;
        }
        if let Some(value) = non_negative(bottom) {
            self.bottom_radius = value;
        }
        if let Some(value) = non_negative(shadow) {
            self.shadow_offset = value;
        }
    }

    pub fn set_font(
        &mut self,
        name: Option<&str>,
        size: Option<f32>,
        color: Option<&str>,
        v_centered: Option<bool>,
    ) {
        if let Some(name) = name {
            self.font = name.to_string();
        }
        if let Some(value) = positive(size) {
            self.font_size = value;
        }
        if let Some(color) = non_empty(color) {
            self.text_color = color.to_string();
        }
        if let Some(v_centered) = v_centered {
            self.v_centered = v_centered;
        }
    }

    pub fn set_color(
        &mut self,
        box_line: Option<&str>,
        box_fill: Option<&str>,
        text: Option<&str>,
        line: Option<&str>,
    ) {
        if let Some(color) = non_empty(box_line) {
            self.box_line_color = color.to_string();
        }
        if let Some(color) = non_empty(box_fill) {
            self.box_fill_color = color.to_string();
        }
        if let Some(color) = non_empty(text) {
            self.text_color = color.to_string();
        }
        if let Some(color) = non_empty(line) {
            self.line_color = color.to_string();
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::classic()
    }
}

fn positive(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn non_negative(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
