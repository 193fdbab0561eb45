use crate::chart::SizeSpec;
use crate::config::{load_config, parse_chart_file};
use crate::document::Document;
use crate::images::load_requests;
use crate::layout::Align;
use crate::layout_dump::write_layout_dump;
use crate::render::{Surface, SvgSurface, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::debug;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Surface id of the single chart drawn by the command line.
const CANVAS_ID: &str = "orgchart";

#[derive(Parser, Debug)]
#[command(name = "orgr", version, about = "Organization chart renderer in Rust")]
pub struct Args {
    /// Chart file (.json with settings and nodes) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Settings file applied before the chart file's own settings
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width: pixels, 'auto' or 'parent'
    #[arg(short = 'w', long = "width")]
    pub width: Option<String>,

    /// Height: pixels, 'auto' or 'parent'
    #[arg(short = 'H', long = "height")]
    pub height: Option<String>,

    /// Horizontal alignment of the chart on the surface
    #[arg(long = "align", value_enum)]
    pub align: Option<AlignArg>,

    /// Container width used by 'parent' sizes
    #[arg(long = "containerWidth", default_value_t = 1200.0)]
    pub container_width: f32,

    /// Container height used by 'parent' sizes
    #[arg(long = "containerHeight", default_value_t = 800.0)]
    pub container_height: f32,

    /// Device pixels per logical pixel
    #[arg(long = "pixelRatio", default_value_t = 1.0)]
    pub pixel_ratio: f32,

    /// Background color behind the chart
    #[arg(long = "background")]
    pub background: Option<String>,

    /// Write the computed positions as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Measure text with the built-in width table instead of system fonts
    #[arg(long = "fastText")]
    pub fast_text: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlignArg {
    Left,
    Center,
}

impl From<AlignArg> for Align {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Left => Align::Left,
            AlignArg::Center => Align::Center,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    config.render.pixel_ratio = args.pixel_ratio;
    config.render.fast_text_metrics = args.fast_text;
    if args.background.is_some() {
        config.render.background = args.background.clone();
    }

    let (input, base_dir) = read_input(args.input.as_deref())?;
    let file = parse_chart_file(&input)?;
    if file.nodes.is_empty() {
        return Err(anyhow::anyhow!("No nodes found in input"));
    }

    let (mut chart, mut request, rejected) = file.build(&config);
    for err in &rejected {
        debug!("skipped node: {err}");
    }
    if let Some(width) = args.width.as_deref() {
        request.width = SizeSpec::parse(width);
    }
    if let Some(height) = args.height.as_deref() {
        request.height = SizeSpec::parse(height);
    }
    if let Some(align) = args.align {
        request.align = align.into();
    }

    let mut doc = Document::new();
    doc.add_canvas(CANVAS_ID, SvgSurface::with_options(&config.render));
    doc.set_container_size(CANVAS_ID, args.container_width, args.container_height);
    chart.draw(&mut doc, CANVAS_ID, request)?;

    // Images are fetched after the first paint and patched in afterwards.
    let requests = chart.take_image_requests();
    if !requests.is_empty() {
        let sent = load_requests(&requests, base_dir.as_deref(), &chart.image_sender());
        let painted = chart.pump_images(&mut doc);
        debug!("images: {} requested, {sent} answered, {painted} painted", requests.len());
    }

    let surface = doc
        .surface(CANVAS_ID)
        .ok_or_else(|| anyhow::anyhow!("drawing surface '{CANVAS_ID}' disappeared"))?;
    let svg = surface.to_svg();
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &chart, surface.size())?;
    }

    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let font = crate::render::text::font_spec(&chart.style().font, chart.style().font_size);
            write_png(&svg, &output, &font.family)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, font_family: &str) -> Result<()> {
    crate::render::write_output_png(svg, output, font_family)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _font_family: &str) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

/// Reads the chart file and returns it with the directory that relative
/// image references are resolved against.
fn read_input(path: Option<&Path>) -> Result<(String, Option<PathBuf>)> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().map(Path::to_path_buf);
        return Ok((content, base));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, None))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
