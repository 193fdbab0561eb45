use std::collections::BTreeMap;

use crate::render::SvgSurface;

/// One drawing surface of the host page and the element that contains it.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub surface: SvgSurface,
    /// Client size of the containing element, when the host reported one.
    pub container: Option<(f32, f32)>,
}

/// The host page as far as charts are concerned: drawing surfaces looked up
/// by id.
#[derive(Debug, Clone, Default)]
pub struct Document {
    canvases: BTreeMap<String, Canvas>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the surface with the given id.
    pub fn add_canvas(&mut self, id: impl Into<String>, surface: SvgSurface) {
        self.canvases.insert(
            id.into(),
            Canvas {
                surface,
                container: None,
            },
        );
    }

    /// Records a new client size of the element around `id`. Returns false
    /// when there is no such surface.
    pub fn set_container_size(&mut self, id: &str, width: f32, height: f32) -> bool {
        match self.canvases.get_mut(id) {
            Some(canvas) => {
                canvas.container = Some((width, height));
                true
            }
            None => false,
        }
    }

    pub fn canvas(&self, id: &str) -> Option<&Canvas> {
        self.canvases.get(id)
    }

    pub fn canvas_mut(&mut self, id: &str) -> Option<&mut Canvas> {
        self.canvases.get_mut(id)
    }

    pub fn surface(&self, id: &str) -> Option<&SvgSurface> {
        self.canvases.get(id).map(|canvas| &canvas.surface)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.canvases.keys().map(String::as_str)
    }
}
