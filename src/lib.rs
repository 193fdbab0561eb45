pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod images;
pub mod interaction;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod render;
pub mod style;
pub mod text_metrics;
pub mod tree;

pub use chart::{Chart, DrawRequest, LogNotifier, Notifier, SizeSpec};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{ChartFile, Config, load_chart_file, load_config, parse_chart_file};
pub use document::{Canvas, Document};
pub use error::ChartError;
pub use images::{ImageData, ImageEvent, ImageRequest};
pub use interaction::{Cursor, MouseButton, Navigation, relayout_on_resize};
pub use layout::{Align, Geometry, LayoutOptions};
pub use model::{ConnectorType, ImageAlign, ImageState, ImageVAlign, Node, NodeSpec};
pub use render::{RenderOptions, Surface, SvgSurface};
pub use style::Style;
