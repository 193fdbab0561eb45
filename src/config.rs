use anyhow::anyhow;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chart::{Chart, DrawRequest, SizeSpec};
use crate::error::ChartError;
use crate::layout::{Align, LayoutOptions};
use crate::model::NodeSpec;
use crate::render::RenderOptions;
use crate::style::Style;

/// Everything a chart is built with before nodes are added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub style: Style,
    pub layout: LayoutOptions,
    pub render: RenderOptions,
    pub draw: DrawRequest,
}

/// Setting values arrive as numbers, numeric strings or flags depending
/// on who produced the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl NumberOrString {
    /// Numeric value, or `None` when the value does not parse.
    pub fn as_f32(&self) -> Option<f32> {
        let value = match self {
            Self::Number(value) => Some(*value as f32),
            Self::Text(text) => text.trim().trim_end_matches("px").parse::<f32>().ok(),
            Self::Flag(_) => None,
        };
        value.filter(|value| value.is_finite())
    }

    pub fn as_flag(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Number(value) => *value != 0.0,
            Self::Text(text) => !matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false" | "t" | "top" | "no"
            ),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Flag(flag) => flag.to_string(),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Chart settings in the host page's vocabulary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub canvas_width: Option<NumberOrString>,
    pub canvas_height: Option<NumberOrString>,
    pub center: Option<NumberOrString>,
    pub border_color: Option<String>,
    pub background_color: Option<String>,
    pub font_color: Option<String>,
    pub line_color: Option<String>,
    pub font_name: Option<String>,
    pub font_size: Option<NumberOrString>,
    pub vertical_alignment: Option<NumberOrString>,
    pub node_width: Option<NumberOrString>,
    pub node_height: Option<NumberOrString>,
    pub horizontal_space: Option<NumberOrString>,
    pub vertical_space: Option<NumberOrString>,
    pub horizontal_offset: Option<NumberOrString>,
    pub top_radius: Option<NumberOrString>,
    pub bottom_radius: Option<NumberOrString>,
    pub shadow_offset: Option<NumberOrString>,
}

fn number(value: &Option<NumberOrString>) -> Option<f32> {
    value.as_ref().and_then(NumberOrString::as_f32)
}

impl Settings {
    /// Applies colors, font, size and node style, in that order.
    pub fn apply_to_style(&self, style: &mut Style) {
        style.set_color(
            self.border_color.as_deref(),
            self.background_color.as_deref(),
            self.font_color.as_deref(),
            self.line_color.as_deref(),
        );
        style.set_font(
            self.font_name.as_deref().filter(|name| !name.is_empty()),
            number(&self.font_size),
            self.font_color.as_deref(),
            self.vertical_alignment.as_ref().map(NumberOrString::as_flag),
        );
        style.set_size(
            number(&self.node_width),
            number(&self.node_height),
            number(&self.horizontal_space),
            number(&self.vertical_space),
            number(&self.horizontal_offset),
        );
        style.set_node_style(
            number(&self.top_radius),
            number(&self.bottom_radius),
            number(&self.shadow_offset),
        );
    }

    /// Overrides the parts of `base` these settings define.
    pub fn draw_request(&self, base: DrawRequest) -> DrawRequest {
        let size = |value: &Option<NumberOrString>, fallback: SizeSpec| match value {
            Some(value) => SizeSpec::parse(&value.as_text()),
            None => fallback,
        };
        DrawRequest {
            width: size(&self.canvas_width, base.width),
            height: size(&self.canvas_height, base.height),
            align: match &self.center {
                Some(center) if center.as_flag() => Align::Center,
                Some(_) => Align::Left,
                None => base.align,
            },
        }
    }
}

/// One node as stored in a chart file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeRecord {
    pub id: Option<NumberOrString>,
    pub parent: Option<NumberOrString>,
    pub position: Option<String>,
    pub text: Option<String>,
    pub bold: Option<NumberOrString>,
    pub url: Option<String>,
    pub border_color: Option<String>,
    pub background_color: Option<String>,
    pub font_color: Option<String>,
    pub image_url: Option<String>,
    pub image_alignment: Option<String>,
}

impl NodeRecord {
    pub fn to_spec(&self) -> NodeSpec {
        let mut spec = NodeSpec {
            id: self.id.as_ref().map(NumberOrString::as_text),
            parent: self.parent.as_ref().map(NumberOrString::as_text),
            connector: self.position.clone(),
            text: self.text.clone().unwrap_or_default(),
            bold: self.bold.as_ref().is_some_and(NumberOrString::as_flag),
            url: self.url.clone().filter(|url| !url.is_empty()),
            ..NodeSpec::default()
        };
        spec = spec.colors(
            self.border_color.as_deref(),
            self.background_color.as_deref(),
            self.font_color.as_deref(),
        );
        if let Some(source) = self.image_url.as_deref().filter(|src| !src.is_empty()) {
            spec = spec.image(source, self.image_alignment.as_deref());
        }
        spec
    }
}

/// A settings object plus its node list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartFile {
    pub settings: Settings,
    pub nodes: Vec<NodeRecord>,
}

impl ChartFile {
    /// Builds a chart from `config` with these settings applied on top and
    /// every node added in file order. Rejected nodes are returned next to
    /// the chart; they never stop the rest from being added.
    pub fn build(&self, config: &Config) -> (Chart, DrawRequest, Vec<ChartError>) {
        let mut chart = Chart::new();
        *chart.style_mut() = config.style.clone();
        *chart.layout_options_mut() = config.layout.clone();
        *chart.render_options_mut() = config.render.clone();
        self.settings.apply_to_style(chart.style_mut());

        let mut rejected = Vec::new();
        for record in &self.nodes {
            if let Err(err) = chart.add_node(record.to_spec()) {
                rejected.push(err);
            }
        }
        debug!(
            "chart file: {} nodes added, {} rejected",
            chart.nodes().len(),
            rejected.len()
        );
        (chart, self.settings.draw_request(config.draw), rejected)
    }
}

/// Parses JSON, falling back to JSON5 for hand-written files.
fn parse_lenient<T: for<'de> Deserialize<'de>>(contents: &str) -> anyhow::Result<T> {
    match serde_json::from_str(contents) {
        Ok(value) => Ok(value),
        Err(json_err) => json5::from_str(contents)
            .map_err(|err| anyhow!("invalid JSON ({json_err}) and invalid JSON5 ({err})")),
    }
}

pub fn parse_chart_file(contents: &str) -> anyhow::Result<ChartFile> {
    parse_lenient(contents)
}

pub fn load_chart_file(path: &Path) -> anyhow::Result<ChartFile> {
    let contents = std::fs::read_to_string(path)?;
    parse_chart_file(&contents).map_err(|err| anyhow!("{}: {err}", path.display()))
}

/// Loads a settings file on top of the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let settings: Settings =
        parse_lenient(&contents).map_err(|err| anyhow!("{}: {err}", path.display()))?;
    settings.apply_to_style(&mut config.style);
    config.draw = settings.draw_request(config.draw);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_may_be_strings() {
        let settings: Settings = serde_json::from_str(
            r#"{"node_width": "140", "node_height": 40, "horizontal_space": "wide", "font_size": "14px"}"#,
        )
        .unwrap();
        let mut style = Style::classic();
        settings.apply_to_style(&mut style);
        assert_eq!(style.box_width, 140.0);
        assert_eq!(style.box_height, 40.0);
        assert_eq!(style.h_space, 20.0);
        assert_eq!(style.font_size, 14.0);
    }

    #[test]
    fn draw_request_reads_canvas_keys() {
        let settings: Settings =
            serde_json::from_str(r#"{"canvas_width": "parent", "canvas_height": 600, "center": 1}"#)
                .unwrap();
        let request = settings.draw_request(DrawRequest::default());
        assert_eq!(request.width, SizeSpec::Container);
        assert_eq!(request.height, SizeSpec::Fixed(600.0));
        assert_eq!(request.align, Align::Center);
        let untouched = Settings::default().draw_request(request);
        assert_eq!(untouched, request);
    }

    #[test]
    fn vertical_alignment_flag() {
        let mut style = Style::classic();
        let top: Settings = serde_json::from_str(r#"{"vertical_alignment": "0"}"#).unwrap();
        top.apply_to_style(&mut style);
        assert!(!style.v_centered);
        let centered: Settings = serde_json::from_str(r#"{"vertical_alignment": "c"}"#).unwrap();
        centered.apply_to_style(&mut style);
        assert!(style.v_centered);
    }

    #[test]
    fn records_become_specs() {
        let record: NodeRecord = serde_json::from_str(
            r##"{"id": 7, "parent": "1", "position": "l", "text": "Ops", "bold": "1",
                "url": "", "background_color": "#EEEEEE", "image_url": "ops.png", "image_alignment": "rt"}"##,
        )
        .unwrap();
        let spec = record.to_spec();
        assert_eq!(spec.id.as_deref(), Some("7"));
        assert_eq!(spec.parent.as_deref(), Some("1"));
        assert_eq!(spec.connector.as_deref(), Some("l"));
        assert!(spec.bold);
        assert_eq!(spec.url, None);
        assert_eq!(spec.fill_color.as_deref(), Some("#EEEEEE"));
        assert_eq!(spec.image.as_deref(), Some("ops.png"));
        assert_eq!(spec.image_align.as_deref(), Some("rt"));
    }

    #[test]
    fn json5_files_are_accepted() {
        let file = parse_chart_file(
            r#"{
                // hand written
                settings: { line_color: '#000000' },
                nodes: [{ id: 'a', text: 'A' }, { id: 'b', parent: 'a', text: 'B' },],
            }"#,
        )
        .unwrap();
        assert_eq!(file.nodes.len(), 2);
        assert_eq!(file.settings.line_color.as_deref(), Some("#000000"));
        assert!(parse_chart_file("{ nodes: [").is_err());
    }

    #[test]
    fn build_skips_duplicates_and_keeps_order() {
        let file = parse_chart_file(
            r##"{"settings": {"background_color": "#FAFAFA"},
                "nodes": [{"id": "a"}, {"id": "b", "parent": "a"}, {"id": "a", "text": "again"}]}"##,
        )
        .unwrap();
        let (chart, request, rejected) = file.build(&Config::default());
        assert_eq!(chart.nodes().len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(chart.nodes()[1].fill_color, "#FAFAFA");
        assert_eq!(request, DrawRequest::default());
    }
}
