use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("duplicate node id '{id}', already defined as node {existing}")]
    DuplicateId { id: String, existing: usize },
    #[error("drawing surface '{0}' not found")]
    SurfaceNotFound(String),
    #[error("image '{source_ref}' could not be decoded: {message}")]
    Image { source_ref: String, message: String },
}
