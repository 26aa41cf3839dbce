//! Breaking paragraphs into lines.
//!
//! A paragraph is searched twice at most: first without hyphenation at the
//! normal tolerance, and if that finds nothing, again with flagged breaks and a
//! much looser tolerance. The second pass always produces a result.

use crate::LayoutError;
use crate::breaking::{
    Assessment, BreakResult, BreakStrategy, BreakingAlgorithm, Candidate, SearchStart,
    materialize,
};
use crate::config::{BreakingConfig, LineBreakingConfig, TextAlign};
use crate::events::LayoutEvent;
use folio_types::{ElementSequence, ResolvedSpan};
use log::debug;
use serde::{Deserialize, Serialize};

/// The measure of each line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineWidths {
    Constant(i32),
    /// Lines `1..=widths.len()` use `widths`, every later line uses `rest`.
    PerLine { widths: Vec<i32>, rest: i32 },
}

impl LineWidths {
    /// Width of the 1-based line `line`.
    pub fn width_of(&self, line: usize) -> i32 {
        match self {
            LineWidths::Constant(width) => *width,
            LineWidths::PerLine { widths, rest } => line
                .checked_sub(1)
                .and_then(|i| widths.get(i))
                .copied()
                .unwrap_or(*rest),
        }
    }

    pub fn is_constant(&self) -> bool {
        match self {
            LineWidths::Constant(_) => true,
            LineWidths::PerLine { widths, rest } => widths.iter().all(|w| w == rest),
        }
    }
}

/// Shift applied to one glue element to justify its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlueAdjustment {
    pub index: usize,
    pub delta: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSpan {
    pub span: ResolvedSpan,
    /// Measure the line was broken against.
    pub width: i32,
    /// Horizontal offset of ragged lines.
    pub offset: i32,
    /// Per-glue deltas of justified lines; they sum to the line's difference.
    pub glue_adjustments: Vec<GlueAdjustment>,
    /// The line ends at a flagged penalty.
    pub hyphenated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphLayout {
    pub lines: Vec<LineSpan>,
    pub demerits: f64,
    /// 1 when the paragraph was set without hyphenation, 2 otherwise.
    pub pass: u8,
    pub events: Vec<LayoutEvent>,
}

impl ParagraphLayout {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn spans(&self) -> impl Iterator<Item = &ResolvedSpan> {
        self.lines.iter().map(|l| &l.span)
    }
}

struct LineStrategy<'a> {
    widths: &'a LineWidths,
    ragged_stretch: i64,
}

impl BreakStrategy for LineStrategy<'_> {
    type Payload = ();

    fn assess(
        &mut self,
        _sequence: &ElementSequence,
        candidate: &Candidate<'_, ()>,
    ) -> Result<Assessment<()>, LayoutError> {
        let mut assessment = Assessment::new(i64::from(self.widths.width_of(candidate.line)), ());
        assessment.extra_stretch = self.ragged_stretch;
        Ok(assessment)
    }

    fn varies_by_line(&self) -> bool {
        !self.widths.is_constant()
    }
}

#[derive(Debug, Clone)]
pub struct LineBreaker {
    config: LineBreakingConfig,
    widths: LineWidths,
}

impl LineBreaker {
    pub fn new(config: LineBreakingConfig, widths: LineWidths) -> Self {
        Self { config, widths }
    }

    pub fn config(&self) -> &LineBreakingConfig {
        &self.config
    }

    pub fn widths(&self) -> &LineWidths {
        &self.widths
    }

    pub fn break_paragraph(&self, paragraph: &ElementSequence) -> Result<ParagraphLayout, LayoutError> {
        if paragraph.is_empty() {
            return Err(LayoutError::EmptySequence);
        }

        if let Some(result) = self.search(paragraph, self.config.breaking.tolerance, false, false)? {
            return Ok(self.finish(paragraph, &result, 1));
        }
        debug!(
            "No feasible lines at tolerance {}; retrying with hyphenation.",
            self.config.breaking.tolerance
        );
        let result = self
            .search(
                paragraph,
                self.config.second_pass_tolerance,
                self.config.hyphenation,
                true,
            )?
            .ok_or_else(|| LayoutError::Generic("forced line search returned nothing".to_string()))?;
        Ok(self.finish(paragraph, &result, 2))
    }

    fn search(
        &self,
        paragraph: &ElementSequence,
        tolerance: f64,
        allow_flagged: bool,
        force: bool,
    ) -> Result<Option<BreakResult<()>>, LayoutError> {
        let ragged_stretch = match self.config.text_align {
            TextAlign::Justify => 0,
            _ => i64::from(self.config.ragged_stretch),
        };
        let mut strategy = LineStrategy {
            widths: &self.widths,
            ragged_stretch,
        };
        let config = BreakingConfig {
            tolerance,
            ..self.config.breaking
        };
        BreakingAlgorithm::new(paragraph, config, &mut strategy)
            .allow_flagged_breaks(allow_flagged)
            .find_breaks(SearchStart::fresh(()), force)
    }

    fn finish(&self, paragraph: &ElementSequence, result: &BreakResult<()>, pass: u8) -> ParagraphLayout {
        let materialized = materialize(&result.arena, result.terminal);
        let lines = materialized
            .spans
            .into_iter()
            .map(|span| {
                let slack = span.difference.max(0);
                let (offset, glue_adjustments) = match self.config.text_align {
                    TextAlign::Justify => (0, glue_adjustments(paragraph, &span)),
                    TextAlign::Start => (0, Vec::new()),
                    TextAlign::Center => (slack / 2, Vec::new()),
                    TextAlign::End => (slack, Vec::new()),
                };
                LineSpan {
                    width: self.widths.width_of(span.line),
                    offset,
                    glue_adjustments,
                    hyphenated: paragraph
                        .element_at(span.break_index())
                        .is_some_and(|e| e.is_flagged()),
                    span,
                }
            })
            .collect();
        ParagraphLayout {
            lines,
            demerits: result.demerits(),
            pass,
            events: materialized.events,
        }
    }
}

/// Distributes a justified line's difference over its glue, proportionally to
/// each glue's stretch (or shrink). Rounding leftovers land on the last
/// adjustable glue, so the deltas sum to the difference exactly. Overfull
/// lines shrink every glue to its minimum.
pub fn glue_adjustments(sequence: &ElementSequence, span: &ResolvedSpan) -> Vec<GlueAdjustment> {
    let range = sequence.range(span.start..span.break_index());
    let content_start = range.content_start();
    let stretching = span.difference >= 0;
    let shares: Vec<(usize, i64)> = range
        .iter()
        .filter(|(i, e)| *i >= content_start && e.is_glue())
        .map(|(i, e)| {
            let extent = e.extent();
            let share = if stretching {
                extent.stretch()
            } else {
                extent.shrink()
            };
            (i, i64::from(share))
        })
        .filter(|(_, share)| *share > 0)
        .collect();
    let total: i64 = shares.iter().map(|(_, s)| s).sum();
    if total == 0 || span.difference == 0 {
        return Vec::new();
    }

    let target = if stretching {
        i64::from(span.difference)
    } else {
        i64::from(span.difference).max(-total)
    };
    let ratio = target as f64 / total as f64;
    let mut adjustments: Vec<GlueAdjustment> = shares
        .iter()
        .map(|&(index, share)| GlueAdjustment {
            index,
            delta: (ratio * share as f64).round() as i32,
        })
        .collect();
    let assigned: i64 = adjustments.iter().map(|a| i64::from(a.delta)).sum();
    if let Some(last) = adjustments.last_mut() {
        last.delta += (target - assigned) as i32;
    }
    adjustments
}
