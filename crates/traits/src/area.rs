//! AreaSink trait: the hand-off from resolved spans to geometry construction.

use folio_types::ResolvedSpan;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AreaError {
    #[error("Area for elements {start}..{end} could not be built: {message}")]
    Rejected {
        start: usize,
        end: usize,
        message: String,
    },
}

/// Receives each resolved span, in order, and turns it into positioned geometry.
pub trait AreaSink {
    fn emit_area(&mut self, span: &ResolvedSpan, adjustment_ratio: f64) -> Result<(), AreaError>;
}

/// A sink that records every span it receives.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    spans: Vec<ResolvedSpan>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> &[ResolvedSpan] {
        &self.spans
    }

    pub fn into_spans(self) -> Vec<ResolvedSpan> {
        self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl AreaSink for CollectingSink {
    fn emit_area(&mut self, span: &ResolvedSpan, adjustment_ratio: f64) -> Result<(), AreaError> {
        let mut recorded = *span;
        recorded.adjustment_ratio = adjustment_ratio;
        self.spans.push(recorded);
        Ok(())
    }
}
