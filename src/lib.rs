//! Optimal line and page breaking for flowing documents.
//!
//! The breaking engine lives in `folio-layout`; this crate wires it into a
//! document pipeline: a JSON document model, a monospace element producer, the
//! forward-reference resolver and the executors that run page sequences.

pub mod document;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod producer;
pub mod resolver;

pub use document::{DocumentSpec, FlowItem, FootnoteSpec, PageSequenceSpec, ParagraphSpec, PipelineConfig};
pub use error::PipelineError;
pub use executor::{Executor, ExecutorImpl, SyncExecutor};
#[cfg(feature = "rayon-executor")]
pub use executor::RayonExecutor;
pub use pipeline::{AnchorLayout, Citation, DocumentLayout, LinePlacement, Pipeline, SequenceLayout};
pub use producer::MonospaceProducer;
pub use resolver::{ReferenceResolver, Resolution, ResolverError, UNRESOLVED_PLACEHOLDER, UnresolvedReference};

pub use folio_layout as layout;
pub use folio_traits as traits;
pub use folio_types as types;
