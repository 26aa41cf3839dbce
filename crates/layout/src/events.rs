//! Non-fatal conditions reported alongside a layout result.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutEvent {
    /// The span `start..end` is wider (or taller) than its line or page even at
    /// maximum shrink. `amount` is the excess in millipoints.
    #[serde(rename_all = "camelCase")]
    ContentOverflow {
        start: usize,
        end: usize,
        line: usize,
        amount: i64,
    },
    /// A page turned out to use a smaller master than the search assumed and
    /// the flow was searched again from `page_index`.
    #[serde(rename_all = "camelCase")]
    Relayout { page_index: usize, attempt: usize },
    /// Footnote bodies that did not fit on the page of their citation.
    #[serde(rename_all = "camelCase")]
    FootnotesDeferred { page_index: usize, count: usize },
}

impl LayoutEvent {
    pub fn is_overflow(&self) -> bool {
        matches!(self, LayoutEvent::ContentOverflow { .. })
    }
}
