use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::ChartError;

/// Encoded image bytes plus the natural size in pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn decode(source: &str, bytes: Vec<u8>) -> Result<Self, ChartError> {
        let to_error = |message: String| ChartError::Image {
            source_ref: source.to_string(),
            message,
        };
        let reader = image::ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|err| to_error(err.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| to_error("unknown image format".to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|err| to_error(err.to_string()))?;
        if width == 0 || height == 0 {
            return Err(to_error("image has no pixels".to_string()));
        }
        Ok(Self {
            width,
            height,
            mime: format.to_mime_type().to_string(),
            bytes,
        })
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Completion notice for one image request.
#[derive(Debug, Clone)]
pub struct ImageEvent {
    pub node: usize,
    pub source: String,
    pub result: Result<ImageData, String>,
}

/// A node image that still has to be fetched by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub node: usize,
    pub source: String,
}

/// The asynchronous boundary between image loaders and the chart: loaders
/// post completions through a cloned sender; the chart drains them between
/// paints.
#[derive(Debug)]
pub struct ImageChannel {
    tx: Sender<ImageEvent>,
    rx: Receiver<ImageEvent>,
}

impl ImageChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<ImageEvent> {
        self.tx.clone()
    }

    pub fn drain(&self) -> Vec<ImageEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

impl Default for ImageChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves an image reference relative to the directory of the chart file.
/// Remote references are returned as-is.
pub fn resolve_image_path(base: Option<&Path>, source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.is_absolute() || source.contains("://") {
        return path.to_path_buf();
    }
    match base {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}

pub fn load_image_file(path: &Path) -> anyhow::Result<ImageData> {
    let bytes = std::fs::read(path)?;
    Ok(ImageData::decode(&path.display().to_string(), bytes)?)
}

/// Fulfils every request from the local filesystem and posts the results.
pub fn load_requests(
    requests: &[ImageRequest],
    base: Option<&Path>,
    sender: &Sender<ImageEvent>,
) -> usize {
    let mut sent = 0;
    for request in requests {
        let path = resolve_image_path(base, &request.source);
        let result = load_image_file(&path).map_err(|err| err.to_string());
        let event = ImageEvent {
            node: request.node,
            source: request.source.clone(),
            result,
        };
        if sender.send(event).is_ok() {
            sent += 1;
        }
    }
    sent
}

#[cfg(test)]
pub(crate) fn tiny_png() -> Vec<u8> {
    // 2x1 RGBA image.
    let mut bytes = Vec::new();
    let buffer = image::RgbaImage::from_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
    buffer
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}
