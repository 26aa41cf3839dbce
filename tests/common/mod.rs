pub mod fixtures;

use folio::{DocumentLayout, DocumentSpec, Pipeline, PipelineError};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses `doc` and runs it on the sequential executor.
pub fn run_document(doc: &Value) -> Result<DocumentLayout, PipelineError> {
    let document = DocumentSpec::from_json(&doc.to_string())?;
    Pipeline::new().run(&document)
}

/// Page count of the named sequence.
pub fn pages_of(layout: &DocumentLayout, sequence: &str) -> usize {
    layout
        .sequence(sequence)
        .map(|s| s.page_count())
        .unwrap_or_default()
}

/// Number of lines on each page of the named sequence.
pub fn lines_per_page(layout: &DocumentLayout, sequence: &str) -> Vec<usize> {
    layout
        .sequence(sequence)
        .map(|s| {
            s.pages
                .pages
                .iter()
                .map(|page| s.lines_on(page).count())
                .collect()
        })
        .unwrap_or_default()
}
