use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Cannot break an empty element sequence.")]
    EmptySequence,
    #[error("Search start {0} lies outside the element sequence.")]
    InvalidStart(usize),
    #[error("Page sequence master '{sequence}' has no master left for page {page_index}.")]
    PageMasterExhausted { sequence: String, page_index: usize },
    #[error("No conditional master of '{sequence}' matches page {page_index}.")]
    NoMatchingPageMaster { sequence: String, page_index: usize },
    #[error("Unknown page master '{0}'.")]
    UnknownPageMaster(String),
    #[error("Pages still do not fit their masters after {attempts} re-searches (page {page_index}).")]
    RelayoutLimitExceeded { attempts: usize, page_index: usize },
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod breaking;
pub mod config;
pub mod events;
pub mod line;
pub mod page;
pub mod page_master;

pub use self::breaking::{BreakResult, BreakStrategy, BreakingAlgorithm, SearchStart};
pub use self::config::{BreakingConfig, LineBreakingConfig, PageBreakingConfig, TextAlign};
pub use self::events::LayoutEvent;
pub use self::line::{GlueAdjustment, LineBreaker, LineSpan, LineWidths, ParagraphLayout};
pub use self::page::{Footnote, PageBreaker, PageFlow, PageLayout, PageSpan};
pub use self::page_master::{
    BlankOrNotBlank, ConditionalMaster, OddOrEven, PageMaster, PageMasterPolicy, PagePosition,
    PageSequenceMaster, PageSlot, SequenceMasterPolicy, SubSequence,
};

#[cfg(test)]
mod page_test;
#[cfg(test)]
mod test_utils;
