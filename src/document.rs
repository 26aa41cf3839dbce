//! The JSON document model accepted by the pipeline and the CLI.
//!
//! A document names its page masters, optional page sequence masters, the breaking
//! configuration and a list of page sequences. Each page sequence is a flat flow of
//! paragraphs, fixed-height blocks, explicit page breaks and reference markers.

use crate::error::PipelineError;
use folio_layout::{
    Footnote, LayoutError, LineBreakingConfig, PageBreakingConfig, PageMaster, PageMasterPolicy,
    PageSequenceMaster, SequenceMasterPolicy,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub line: LineBreakingConfig,
    pub page: PageBreakingConfig,
    /// Width of every character for the built-in monospace producer, in millipoints.
    pub char_width: i32,
    /// Run independent page sequences on the parallel executor.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            line: LineBreakingConfig::default(),
            page: PageBreakingConfig::default(),
            char_width: 6000,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentSpec {
    pub page_masters: Vec<PageMaster>,
    pub sequence_masters: Vec<PageSequenceMaster>,
    pub config: PipelineConfig,
    pub sequences: Vec<PageSequenceSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSequenceSpec {
    pub name: String,
    /// A page master or a page sequence master.
    pub master: String,
    #[serde(default = "default_initial_page_number")]
    pub initial_page_number: usize,
    #[serde(default)]
    pub flow: Vec<FlowItem>,
}

fn default_initial_page_number() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowItem {
    Paragraph(ParagraphSpec),
    #[serde(rename_all = "camelCase")]
    Block {
        height: i32,
        #[serde(default)]
        keep_with_previous: bool,
        #[serde(default)]
        keep_with_next: bool,
    },
    PageBreak,
    /// Marks the position of `id`; it resolves to the number of the page holding the next content.
    Anchor { id: String },
    /// Cites the page number of `id`, which may be declared later in the document.
    PageCitation { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParagraphSpec {
    pub text: String,
    pub line_height: i32,
    pub space_before: i32,
    pub space_after: i32,
    pub keep_together: bool,
    pub keep_with_previous: bool,
    pub keep_with_next: bool,
    pub footnotes: Vec<FootnoteSpec>,
}

impl Default for ParagraphSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            line_height: 12000,
            space_before: 0,
            space_after: 0,
            keep_together: false,
            keep_with_previous: false,
            keep_with_next: false,
            footnotes: Vec::new(),
        }
    }
}

impl ParagraphSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A footnote body cited from the first line of its paragraph.
///
/// Either one unsplittable `height`, or the heights of its `lines`, between
/// which the body may continue on the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootnoteSpec {
    pub height: i32,
    pub lines: Vec<i32>,
}

impl FootnoteSpec {
    pub fn to_footnote(&self, citation: usize) -> Footnote {
        if self.lines.is_empty() {
            Footnote::new(citation, self.height)
        } else {
            Footnote::with_lines(citation, self.lines.clone())
        }
    }
}

impl DocumentSpec {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let doc: DocumentSpec = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Checks that every sequence names a known master.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sequences.is_empty() {
            return Err(PipelineError::InvalidDocument(
                "No page sequences defined.".to_string(),
            ));
        }
        for sequence in &self.sequences {
            self.policy_for(&sequence.master)?;
        }
        Ok(())
    }

    pub fn page_master(&self, name: &str) -> Option<&PageMaster> {
        self.page_masters.iter().find(|m| m.name == name)
    }

    /// The master selection policy for `name`. Sequence masters shadow page masters.
    pub fn policy_for(&self, name: &str) -> Result<Box<dyn PageMasterPolicy>, LayoutError> {
        if let Some(sequence) = self.sequence_masters.iter().find(|s| s.name == name) {
            let policy = SequenceMasterPolicy::new(sequence.clone(), self.page_masters.clone())?;
            return Ok(Box::new(policy));
        }
        self.page_master(name)
            .map(|m| Box::new(m.clone()) as Box<dyn PageMasterPolicy>)
            .ok_or_else(|| LayoutError::UnknownPageMaster(name.to_string()))
    }
}
