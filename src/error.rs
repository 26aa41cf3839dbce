use crate::resolver::ResolverError;
use folio_layout::LayoutError;
use folio_traits::{AreaError, ProducerError};
use thiserror::Error;

/// A comprehensive error type for the whole breaking pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Element production failed: {0}")]
    Producer(#[from] ProducerError),

    #[error("Reference resolution failed: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Area construction failed: {0}")]
    Area(#[from] AreaError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is invalid or missing required parts: {0}")]
    InvalidDocument(String),

    #[error("Page sequence '{sequence}' failed: {source}")]
    Sequence {
        sequence: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// The innermost error, looking through sequence wrappers.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Sequence { source, .. } => source.root(),
            other => other,
        }
    }
}
