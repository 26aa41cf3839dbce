//! Breaking a flow of block-level elements into pages.
//!
//! The page search reuses the line search with a strategy that knows about page
//! masters, footnotes and paragraph runs. Because the master of the last page may
//! differ from the others, the flow is first searched assuming no page is last;
//! when the page count is known the masters are checked again and the flow is
//! re-searched from the first page that no longer fits.

use crate::LayoutError;
use crate::breaking::{
    Assessment, BreakStrategy, BreakingAlgorithm, Candidate, SearchStart, ordered_chain,
    overflow_event, span_between,
};
use crate::config::PageBreakingConfig;
use crate::events::LayoutEvent;
use crate::page_master::{PageMasterPolicy, PageSlot};
use folio_types::{ElementSequence, FitnessClass, ProducerId, ResolvedSpan};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Demerits of a page whose master could not be selected. Such a page is only
/// ever chosen when nothing else is possible, and then reported as an error.
const EXHAUSTED_DEMERITS: f64 = 1.0e12;

/// A footnote body cited by the box at `citation`.
///
/// The body is a stack of lines. It may be split between two lines when
/// `allow_footnote_split` is on; a single-line body is atomic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub citation: usize,
    pub lines: Vec<i32>,
}

impl Footnote {
    /// An unsplittable body of `height`.
    pub fn new(citation: usize, height: i32) -> Self {
        Self {
            citation,
            lines: vec![height],
        }
    }

    pub fn with_lines(citation: usize, lines: Vec<i32>) -> Self {
        Self { citation, lines }
    }

    pub fn height(&self) -> i64 {
        self.lines.iter().map(|&h| i64::from(h)).sum()
    }
}

/// Footnote bodies of a flow flattened into one list of lines.
#[derive(Debug, Default)]
struct FootnoteLines {
    /// `prefix[k]` sums the heights of lines `0..k`.
    prefix: Vec<i64>,
    /// `starts[f]` is the first line of footnote `f`; the last entry is the line count.
    starts: Vec<usize>,
}

impl FootnoteLines {
    fn build(footnotes: &[Footnote]) -> Self {
        let mut index = FootnoteLines {
            prefix: vec![0],
            starts: Vec::with_capacity(footnotes.len() + 1),
        };
        for footnote in footnotes {
            index.starts.push(index.prefix.len() - 1);
            // An empty body still takes one (zero-height) line so it can be placed.
            let lines: &[i32] = if footnote.lines.is_empty() {
                &[0]
            } else {
                &footnote.lines
            };
            for &height in lines {
                let last = index.prefix[index.prefix.len() - 1];
                index.prefix.push(last + i64::from(height));
            }
        }
        index.starts.push(index.prefix.len() - 1);
        index
    }

    fn line_count(&self) -> usize {
        self.prefix.len() - 1
    }

    /// First line of footnote `footnote`, or the line count past the last one.
    fn start_of(&self, footnote: usize) -> usize {
        self.starts[footnote.min(self.starts.len() - 1)]
    }

    fn height(&self, from: usize, to: usize) -> i64 {
        self.prefix[to] - self.prefix[from]
    }

    fn is_boundary(&self, line: usize) -> bool {
        self.starts.binary_search(&line).is_ok()
    }

    /// Footnotes whose every line is among the first `lines`.
    fn complete(&self, lines: usize) -> usize {
        self.starts[1..].partition_point(|&end| end <= lines)
    }

    /// Footnotes with at least one line among the first `lines`.
    fn started(&self, lines: usize) -> usize {
        self.starts[..self.starts.len() - 1].partition_point(|&start| start < lines)
    }

    /// Smallest cut after `line`: the next line, or the next footnote boundary.
    fn next_cut(&self, line: usize, split: bool) -> usize {
        if split {
            return line + 1;
        }
        let next = self.starts.partition_point(|&start| start <= line);
        self.starts[next.min(self.starts.len() - 1)]
    }

    /// Footnotes with at least one line in `lines`.
    fn touched(&self, lines: &Range<usize>) -> Range<usize> {
        if lines.is_empty() {
            let at = self.complete(lines.start);
            return at..at;
        }
        let first = self.starts.partition_point(|&start| start <= lines.start) - 1;
        let last = self.starts.partition_point(|&start| start < lines.end);
        first..last
    }
}

/// Elements of one page sequence plus the footnotes cited from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFlow {
    pub elements: ElementSequence,
    pub footnotes: Vec<Footnote>,
}

impl PageFlow {
    pub fn new(elements: ElementSequence) -> Self {
        Self {
            elements,
            footnotes: Vec::new(),
        }
    }

    /// Footnotes are kept in citation order.
    pub fn with_footnotes(mut self, mut footnotes: Vec<Footnote>) -> Self {
        footnotes.sort_by_key(|f| f.citation);
        self.footnotes = footnotes;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpan {
    /// Empty (`start == end`) for pages that only carry deferred footnotes.
    pub span: ResolvedSpan,
    /// 0-based index within the page sequence.
    pub index: usize,
    pub number: usize,
    pub master: String,
    /// Indices into the flow's footnotes with at least one line on this page.
    pub footnotes: Range<usize>,
    /// Footnote body lines on this page, counted across all bodies of the flow.
    pub footnote_lines: Range<usize>,
    pub footnote_area: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub pages: Vec<PageSpan>,
    pub demerits: f64,
    pub relayouts: usize,
    pub events: Vec<LayoutEvent>,
}

impl PageLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page holding element `index`, if any.
    pub fn page_of(&self, index: usize) -> Option<&PageSpan> {
        self.pages.iter().find(|p| p.span.range().contains(&index))
    }
}

/// What a page node carries along its chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageState {
    /// Footnote body lines placed on this and all earlier pages.
    pub placed: usize,
    /// Region height of the master the page was assessed with.
    pub region: i64,
    pub footnote_area: i64,
    pub exhausted: bool,
}

/// Consecutive boxes of one producer, i.e. the lines of one paragraph.
#[derive(Debug, Default)]
struct RunIndex {
    /// `(element index, run id, 1-based ordinal within the run)` per box.
    boxes: Vec<(usize, Option<usize>, usize)>,
    run_lengths: Vec<usize>,
}

impl RunIndex {
    fn build(sequence: &ElementSequence) -> Self {
        let mut index = RunIndex::default();
        let mut current: Option<ProducerId> = None;
        for (i, element) in sequence.iter().enumerate() {
            if !element.is_box() {
                continue;
            }
            match element.producer() {
                Some(producer) => {
                    if current != Some(producer) {
                        index.run_lengths.push(0);
                        current = Some(producer);
                    }
                    let run = index.run_lengths.len() - 1;
                    index.run_lengths[run] += 1;
                    index.boxes.push((i, Some(run), index.run_lengths[run]));
                }
                None => {
                    current = None;
                    index.boxes.push((i, None, 0));
                }
            }
        }
        index
    }

    /// Lines of the run cut by a break at `break_index`: `(before, after)`.
    fn split_at(&self, break_index: usize) -> Option<(usize, usize)> {
        let pos = self.boxes.partition_point(|(i, _, _)| *i < break_index);
        if pos == 0 || pos == self.boxes.len() {
            return None;
        }
        let (_, prev_run, ordinal) = self.boxes[pos - 1];
        let (_, next_run, _) = self.boxes[pos];
        match (prev_run, next_run) {
            (Some(a), Some(b)) if a == b => Some((ordinal, self.run_lengths[a] - ordinal)),
            _ => None,
        }
    }
}

struct PageStrategy<'a> {
    config: &'a PageBreakingConfig,
    policy: &'a dyn PageMasterPolicy,
    first_number: usize,
    last_page: Option<usize>,
    footnotes: &'a [Footnote],
    notes: &'a FootnoteLines,
    runs: &'a RunIndex,
}

/// Outcome of fitting pending footnote lines onto one page.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FootnotePlacement {
    /// Lines placed after this page, earlier pages included.
    placed: usize,
    area: i64,
    /// Cited bodies with no line placed yet.
    deferred: usize,
    /// The page ends in the middle of a body.
    split: bool,
}

impl PageStrategy<'_> {
    fn footnote_area(&self, placed_before: usize, upto: usize) -> i64 {
        if upto <= placed_before {
            return 0;
        }
        i64::from(self.config.footnote_separator.opt) + self.notes.height(placed_before, upto)
    }

    fn can_cut_at(&self, line: usize, placed_before: usize) -> bool {
        self.config.allow_footnote_split || line == placed_before || self.notes.is_boundary(line)
    }

    /// Decides how many footnote lines end up placed after this page.
    ///
    /// Lines stay in citation order. A page that cites footnotes must start
    /// the first of them: its first line when bodies may split, the whole body
    /// otherwise. Everything after that may be deferred.
    fn place_footnotes(
        &self,
        placed_before: usize,
        first_new: usize,
        cited: usize,
        natural: i64,
        region: i64,
    ) -> FootnotePlacement {
        let cited_lines = self.notes.start_of(cited).max(placed_before);
        let mut placement = FootnotePlacement {
            placed: placed_before,
            area: 0,
            deferred: 0,
            split: false,
        };
        if cited_lines <= placed_before {
            return placement;
        }
        let all = self.footnote_area(placed_before, cited_lines);
        if natural + all <= region || !self.config.allow_footnote_deferral {
            placement.placed = cited_lines;
            placement.area = all;
            return placement;
        }
        let minimum = if cited > first_new {
            let required = if self.config.allow_footnote_split {
                self.notes.start_of(first_new) + 1
            } else {
                self.notes.start_of(first_new + 1)
            };
            required.max(placed_before)
        } else {
            placed_before
        };
        let upto = (minimum..cited_lines)
            .rev()
            .find(|&line| {
                self.can_cut_at(line, placed_before)
                    && natural + self.footnote_area(placed_before, line) <= region
            })
            .unwrap_or(minimum);

        let split = upto > placed_before && !self.notes.is_boundary(upto);
        placement.placed = upto;
        placement.area = self.footnote_area(placed_before, upto);
        placement.split = split;
        placement.deferred = cited.saturating_sub(self.notes.started(upto));
        placement
    }

    fn bottom_stretch(&self, region: i64) -> i64 {
        (region as f64 * self.config.bottom_stretch.max(0.0)) as i64
    }

    fn run_demerits(&self, break_index: usize) -> f64 {
        let Some((before, after)) = self.runs.split_at(break_index) else {
            return 0.0;
        };
        let mut demerits = 0.0;
        if before < self.config.orphans {
            demerits += self.config.orphan_demerits;
        }
        if after < self.config.widows {
            demerits += self.config.widow_demerits;
        }
        demerits
    }
}

impl BreakStrategy for PageStrategy<'_> {
    type Payload = PageState;

    fn assess(
        &mut self,
        sequence: &ElementSequence,
        candidate: &Candidate<'_, PageState>,
    ) -> Result<Assessment<PageState>, LayoutError> {
        let page_index = candidate.line - 1;
        let slot = PageSlot::new(page_index, self.first_number, self.last_page == Some(page_index));
        let (region, exhausted) = match self.policy.select(&slot) {
            Ok(master) => (i64::from(master.region_height), false),
            Err(LayoutError::PageMasterExhausted { .. }) => (0, true),
            Err(e) => return Err(e),
        };

        let placed_before = candidate.from.payload.placed;
        let first_new = self
            .footnotes
            .partition_point(|f| f.citation < candidate.from.content_start);
        let cited = self
            .footnotes
            .partition_point(|f| f.citation <= candidate.break_index);
        let footnotes =
            self.place_footnotes(placed_before, first_new, cited, candidate.natural, region);
        let (placed, area) = (footnotes.placed, footnotes.area);

        let mut assessment = Assessment::new(
            region - area,
            PageState {
                placed,
                region,
                footnote_area: area,
                exhausted,
            },
        );
        assessment.extra_stretch = self.bottom_stretch(region);
        if placed > placed_before {
            let separator = self.config.footnote_separator;
            assessment.extra_stretch += i64::from(separator.stretch());
            assessment.extra_shrink = i64::from(separator.shrink());
        }
        assessment.extra_demerits =
            footnotes.deferred as f64 * self.config.deferred_footnote_demerits;
        if footnotes.split {
            assessment.extra_demerits += self.config.split_footnote_demerits;
        }
        if candidate.break_index + 1 < sequence.len() {
            assessment.extra_demerits += self.run_demerits(candidate.break_index);
        }
        if exhausted {
            assessment.extra_demerits += EXHAUSTED_DEMERITS;
        }
        Ok(assessment)
    }

    fn varies_by_line(&self) -> bool {
        true
    }
}

/// One page as found by a search, before masters are finalized.
#[derive(Debug, Clone)]
struct PageRecord {
    span: ResolvedSpan,
    state: PageState,
    available_shrink: i64,
    /// Cumulative demerits of the chain up to this page.
    demerits: f64,
}

impl PageRecord {
    /// Height the page needs at maximum shrink, footnotes included.
    fn min_height(&self) -> i64 {
        self.state.region - i64::from(self.span.difference) - self.available_shrink
    }
}

/// A page carrying only footnotes left over at the end of the flow.
#[derive(Debug, Clone)]
struct FootnotePage {
    lines: Range<usize>,
    area: i64,
    region: i64,
}

pub struct PageBreaker<'p> {
    config: PageBreakingConfig,
    policy: &'p dyn PageMasterPolicy,
    first_number: usize,
}

impl<'p> PageBreaker<'p> {
    pub fn new(config: PageBreakingConfig, policy: &'p dyn PageMasterPolicy) -> Self {
        Self {
            config,
            policy,
            first_number: 1,
        }
    }

    /// Printed number of the first page, which decides odd/even masters.
    pub fn with_first_page_number(mut self, number: usize) -> Self {
        self.first_number = number;
        self
    }

    pub fn config(&self) -> &PageBreakingConfig {
        &self.config
    }

    pub fn break_pages(&self, flow: &PageFlow) -> Result<PageLayout, LayoutError> {
        if flow.elements.is_empty() {
            return Err(LayoutError::EmptySequence);
        }
        let runs = RunIndex::build(&flow.elements);
        let notes = FootnoteLines::build(&flow.footnotes);

        let mut last_page: Option<usize> = None;
        let mut records = self.search(
            flow,
            &runs,
            &notes,
            SearchStart::fresh(PageState::default()),
            last_page,
        )?;
        let mut relayouts = 0;
        let mut events = Vec::new();

        let trailing = loop {
            let placed = records.last().map_or(0, |r| r.state.placed);
            let trailing = self.footnote_pages(&notes, records.len(), placed)?;
            let total = records.len() + trailing.len();

            let Some(page_index) = self.first_mismatch(&records, total)? else {
                break trailing;
            };
            if relayouts >= self.config.max_relayout_retries {
                return Err(LayoutError::RelayoutLimitExceeded {
                    attempts: relayouts,
                    page_index,
                });
            }
            relayouts += 1;
            debug!(
                "Page {} uses a smaller master than assumed; re-searching (attempt {}).",
                page_index, relayouts
            );
            events.push(LayoutEvent::Relayout {
                page_index,
                attempt: relayouts,
            });

            last_page = Some(page_index);
            let start = match page_index.checked_sub(1).map(|i| &records[i]) {
                None => SearchStart::fresh(PageState::default()),
                Some(previous) => SearchStart {
                    index: previous.span.end,
                    line: page_index,
                    fitness: previous.span.fitness,
                    demerits: previous.demerits,
                    payload: previous.state,
                },
            };
            let tail = self.search(flow, &runs, &notes, start, last_page)?;
            records.truncate(page_index);
            records.extend(tail);
        };

        let layout = self.assemble(flow, &notes, &records, &trailing, relayouts, events)?;
        info!(
            "Paginated {} elements into {} pages ({} re-searches).",
            flow.elements.len(),
            layout.pages.len(),
            relayouts
        );
        Ok(layout)
    }

    fn search(
        &self,
        flow: &PageFlow,
        runs: &RunIndex,
        notes: &FootnoteLines,
        start: SearchStart<PageState>,
        last_page: Option<usize>,
    ) -> Result<Vec<PageRecord>, LayoutError> {
        let mut strategy = PageStrategy {
            config: &self.config,
            policy: self.policy,
            first_number: self.first_number,
            last_page,
            footnotes: &flow.footnotes,
            notes,
            runs,
        };
        let result = BreakingAlgorithm::new(&flow.elements, self.config.breaking, &mut strategy)
            .find_breaks(start, true)?
            .ok_or_else(|| LayoutError::Generic("forced page search returned nothing".to_string()))?;

        let chain = ordered_chain(&result.arena, result.terminal);
        Ok(chain
            .windows(2)
            .map(|pair| PageRecord {
                span: span_between(pair[0], pair[1]),
                state: pair[1].payload,
                available_shrink: pair[1].available_shrink,
                demerits: pair[1].total_demerits,
            })
            .collect())
    }

    fn slot(&self, index: usize, total: usize) -> PageSlot {
        PageSlot::new(index, self.first_number, index + 1 == total)
    }

    /// First content page whose actual master is smaller than the one it was
    /// laid out for and too small for its content.
    fn first_mismatch(&self, records: &[PageRecord], total: usize) -> Result<Option<usize>, LayoutError> {
        for (index, record) in records.iter().enumerate() {
            let actual = i64::from(self.policy.select(&self.slot(index, total))?.region_height);
            if actual < record.state.region && record.min_height() > actual {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Pages for footnote lines still pending after the last content page. Each
    /// page takes as many lines as fit, and at least one line (or one whole
    /// body when bodies may not split).
    fn footnote_pages(
        &self,
        notes: &FootnoteLines,
        first_index: usize,
        mut placed: usize,
    ) -> Result<Vec<FootnotePage>, LayoutError> {
        let separator = i64::from(self.config.footnote_separator.opt);
        let split = self.config.allow_footnote_split;
        let mut pages = Vec::new();
        while placed < notes.line_count() {
            let slot = PageSlot::new(first_index + pages.len(), self.first_number, false);
            let region = i64::from(self.policy.select(&slot)?.region_height);
            let start = placed;
            placed = notes.next_cut(placed, split);
            while placed < notes.line_count() {
                let next = notes.next_cut(placed, split);
                if separator + notes.height(start, next) > region {
                    break;
                }
                placed = next;
            }
            pages.push(FootnotePage {
                lines: start..placed,
                area: separator + notes.height(start, placed),
                region,
            });
        }
        Ok(pages)
    }

    fn assemble(
        &self,
        flow: &PageFlow,
        notes: &FootnoteLines,
        records: &[PageRecord],
        trailing: &[FootnotePage],
        relayouts: usize,
        mut events: Vec<LayoutEvent>,
    ) -> Result<PageLayout, LayoutError> {
        let total = records.len() + trailing.len();
        let mut pages = Vec::with_capacity(total);
        let mut placed_before = 0;

        for (index, record) in records.iter().enumerate() {
            let master = self.policy.select(&self.slot(index, total))?;
            let mut span = record.span;
            if let Some(event) = overflow_event(&span, record.available_shrink) {
                events.push(event);
            }
            if span.adjustment_ratio > 0.0 {
                if index + 1 == records.len() {
                    span.adjustment_ratio = 0.0;
                } else if span.adjustment_ratio > 1.0 {
                    span.adjustment_ratio = 1.0;
                }
            }
            let cited = flow
                .footnotes
                .partition_point(|f| f.citation <= span.break_index());
            let deferred = cited.saturating_sub(notes.started(record.state.placed));
            if deferred > 0 {
                events.push(LayoutEvent::FootnotesDeferred {
                    page_index: index,
                    count: deferred,
                });
            }
            let lines = placed_before..record.state.placed;
            pages.push(PageSpan {
                span,
                index,
                number: self.first_number + index,
                master: master.name.clone(),
                footnotes: notes.touched(&lines),
                footnote_lines: lines,
                footnote_area: clamp_i32(record.state.footnote_area),
            });
            placed_before = record.state.placed;
        }

        let end = flow.elements.len();
        for (offset, page) in trailing.iter().enumerate() {
            let index = records.len() + offset;
            let master = self.policy.select(&self.slot(index, total))?;
            let span = ResolvedSpan {
                start: end,
                end,
                line: index + 1,
                adjustment_ratio: 0.0,
                fitness: FitnessClass::Decent,
                difference: clamp_i32(page.region - page.area),
            };
            if page.area > page.region {
                warn!(
                    "Footnote page {} overflows by {}.",
                    index,
                    page.area - page.region
                );
                events.push(LayoutEvent::ContentOverflow {
                    start: end,
                    end,
                    line: index + 1,
                    amount: page.area - page.region,
                });
            }
            pages.push(PageSpan {
                span,
                index,
                number: self.first_number + index,
                master: master.name.clone(),
                footnotes: notes.touched(&page.lines),
                footnote_lines: page.lines.clone(),
                footnote_area: clamp_i32(page.area),
            });
        }

        Ok(PageLayout {
            pages,
            demerits: records.last().map_or(0.0, |r| r.demerits),
            relayouts,
            events,
        })
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
