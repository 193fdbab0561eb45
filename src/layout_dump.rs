use crate::chart::Chart;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub box_width: f32,
    pub box_height: f32,
    pub per_row: usize,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub parent: Option<String>,
    pub connector: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub placed: bool,
    pub under: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl LayoutDump {
    /// Positions of the chart's last draw on a surface of `size`.
    pub fn from_chart(chart: &Chart, size: (f32, f32)) -> Self {
        let nodes = chart.nodes();
        let ids = |list: &[usize]| -> Vec<String> {
            list.iter().map(|&idx| nodes[idx].id.clone()).collect()
        };
        let dumped = nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                parent: node.parent.map(|idx| nodes[idx].id.clone()),
                connector: node.kind().as_str().to_string(),
                text: node.text.clone(),
                x: node.x,
                y: node.y,
                placed: node.placed,
                under: ids(&node.under),
                left: ids(&node.left),
                right: ids(&node.right),
            })
            .collect();

        let style = chart.style();
        LayoutDump {
            width: size.0,
            height: size.1,
            box_width: style.box_width,
            box_height: style.box_height,
            per_row: chart.per_row(),
            nodes: dumped,
        }
    }
}

pub fn write_layout_dump(path: &Path, chart: &Chart, size: (f32, f32)) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_chart(chart, size);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
