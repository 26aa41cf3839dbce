//! Composes the line pass and the page pass over a whole document.
//!
//! For each page sequence, every paragraph is broken into lines at the measure of
//! the sequence's first page master. The lines become rigid boxes of a page flow,
//! interleaved with the penalties and spacing glue that encode keeps and page
//! breaks. The page pass then breaks that flow into pages. Anchors publish the
//! number of their page on the shared resolver, page citations subscribe to it, and
//! whatever is still pending after the last sequence is finalized to the
//! placeholder.

use crate::document::{DocumentSpec, FlowItem, PageSequenceSpec, ParagraphSpec, PipelineConfig};
use crate::error::PipelineError;
use crate::executor::{Executor, ExecutorImpl};
use crate::producer::MonospaceProducer;
use crate::resolver::{ReferenceResolver, UNRESOLVED_PLACEHOLDER};
use folio_layout::{
    Footnote, LayoutError, LayoutEvent, LineBreaker, LineWidths, PageBreaker, PageFlow,
    PageLayout, PageSlot, PageSpan, ParagraphLayout,
};
use folio_traits::{AreaError, AreaSink, ElementProducer};
use folio_types::{Element, ElementSequence, ProducerId};
use log::{debug, info};
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Where one line of a paragraph sits in its sequence's page flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePlacement {
    /// Index of the line's box in the page flow.
    pub element: usize,
    pub paragraph: usize,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorLayout {
    pub id: String,
    pub page_number: usize,
}

/// A page-number citation after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub id: String,
    /// Number of the page the citation itself sits on.
    pub page_number: usize,
    /// The cited page number, or the placeholder.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceLayout {
    pub name: String,
    /// Paragraph line layouts, in flow order.
    pub paragraphs: Vec<ParagraphLayout>,
    pub placements: Vec<LinePlacement>,
    pub pages: PageLayout,
    pub anchors: Vec<AnchorLayout>,
    pub citations: Vec<Citation>,
}

impl SequenceLayout {
    pub fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    /// Lines whose boxes fall on `page`, in order.
    pub fn lines_on<'a>(&'a self, page: &'a PageSpan) -> impl Iterator<Item = &'a LinePlacement> {
        let range = page.span.range();
        self.placements
            .iter()
            .filter(move |p| range.contains(&p.element))
    }

    /// Line-pass events of every paragraph followed by the page-pass events.
    pub fn events(&self) -> impl Iterator<Item = &LayoutEvent> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.events.iter())
            .chain(self.pages.events.iter())
    }

    /// Hands every page span, each followed by the spans of its lines, to `sink`.
    pub fn emit_areas(&self, sink: &mut dyn AreaSink) -> Result<(), AreaError> {
        for page in &self.pages.pages {
            sink.emit_area(&page.span, page.span.adjustment_ratio)?;
            for placement in self.lines_on(page) {
                if let Some(line) = self
                    .paragraphs
                    .get(placement.paragraph)
                    .and_then(|p| p.lines.get(placement.line))
                {
                    sink.emit_area(&line.span, line.span.adjustment_ratio)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLayout {
    pub sequences: Vec<SequenceLayout>,
    /// Ids that were cited but never anchored, in first-citation order.
    pub unresolved: Vec<String>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.sequences.iter().map(SequenceLayout::page_count).sum()
    }

    pub fn sequence(&self, name: &str) -> Option<&SequenceLayout> {
        self.sequences.iter().find(|s| s.name == name)
    }

    pub fn events(&self) -> impl Iterator<Item = &LayoutEvent> {
        self.sequences.iter().flat_map(SequenceLayout::events)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.unresolved
            .iter()
            .map(|id| {
                format!(
                    "Unresolved reference '{}' printed as '{}'",
                    id, UNRESOLVED_PLACEHOLDER
                )
            })
            .collect()
    }

    pub fn emit_areas(&self, sink: &mut dyn AreaSink) -> Result<(), AreaError> {
        for sequence in &self.sequences {
            sequence.emit_areas(sink)?;
        }
        Ok(())
    }
}

/// Runs documents through the line and page passes.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    executor: ExecutorImpl,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline whose executor follows the document's `parallel` setting.
    pub fn for_document(doc: &DocumentSpec) -> Self {
        Self::new().with_executor(ExecutorImpl::for_parallelism(doc.config.parallel))
    }

    pub fn with_executor(mut self, executor: ExecutorImpl) -> Self {
        self.executor = executor;
        self
    }

    pub fn run(&self, doc: &DocumentSpec) -> Result<DocumentLayout, PipelineError> {
        doc.validate()?;
        let resolver = ReferenceResolver::<usize>::new();
        let producer = MonospaceProducer::new(doc.config.char_width)
            .with_flagged_penalty(doc.config.line.breaking.flagged_penalty);
        let context = SequenceContext {
            config: &doc.config,
            doc,
            producer: &producer,
            resolver: &resolver,
        };

        info!(
            "Laying out {} page sequence(s) with {}",
            doc.sequences.len(),
            self.executor.name()
        );
        let results = self
            .executor
            .execute_all(doc.sequences.iter().collect::<Vec<_>>(), |sequence| {
                context
                    .lay_out(sequence)
                    .map_err(|source| PipelineError::Sequence {
                        sequence: sequence.name.clone(),
                        source: Box::new(source),
                    })
            });
        let pending = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        let unresolved = resolver.finalize_unresolved()?;
        let sequences = pending.into_iter().map(PendingSequence::finish).collect();
        Ok(DocumentLayout {
            sequences,
            unresolved: unresolved.into_iter().map(|u| u.id.to_string()).collect(),
        })
    }

    /// Runs `doc` and hands every resolved span to `sink`.
    pub fn run_into(
        &self,
        doc: &DocumentSpec,
        sink: &mut dyn AreaSink,
    ) -> Result<DocumentLayout, PipelineError> {
        let layout = self.run(doc)?;
        layout.emit_areas(sink)?;
        Ok(layout)
    }
}

struct SequenceContext<'a> {
    config: &'a PipelineConfig,
    doc: &'a DocumentSpec,
    producer: &'a MonospaceProducer,
    resolver: &'a ReferenceResolver<usize>,
}

impl SequenceContext<'_> {
    fn lay_out(&self, sequence: &PageSequenceSpec) -> Result<PendingSequence, PipelineError> {
        let policy = self.doc.policy_for(&sequence.master)?;
        let first_page = PageSlot::new(0, sequence.initial_page_number, false);
        let measure = policy.select(&first_page)?.region_width;
        let line_breaker = LineBreaker::new(self.config.line, LineWidths::Constant(measure));

        let mut builder = FlowBuilder::new(self.producer, &line_breaker);
        for item in &sequence.flow {
            builder.push(item)?;
        }
        let FlowBuilder {
            elements,
            footnotes,
            paragraphs,
            placements,
            markers,
            ..
        } = builder;

        if elements.is_empty() {
            return Err(LayoutError::EmptySequence.into());
        }
        let mut elements = elements;
        elements.terminate();
        let flow = PageFlow::new(elements).with_footnotes(footnotes);
        let pages = PageBreaker::new(self.config.page, policy.as_ref())
            .with_first_page_number(sequence.initial_page_number)
            .break_pages(&flow)?;

        let mut anchors = Vec::new();
        let mut citations = Vec::new();
        for marker in markers {
            let page_number = page_number_at(&flow.elements, &pages, marker.index);
            match marker.kind {
                MarkerKind::Anchor => {
                    self.resolver.resolve(marker.id.as_str(), page_number)?;
                    anchors.push(AnchorLayout {
                        id: marker.id,
                        page_number,
                    });
                }
                MarkerKind::Citation => {
                    let slot = Arc::new(OnceLock::new());
                    let target = slot.clone();
                    let id = marker.id.clone();
                    self.resolver.register_pending(marker.id.as_str(), move |resolution| {
                        fill_citation(&target, &id, resolution.display());
                    })?;
                    citations.push(PendingCitation {
                        id: marker.id,
                        page_number,
                        slot,
                    });
                }
            }
        }

        info!(
            "Sequence '{}': {} paragraph(s), {} page(s), {} re-search(es)",
            sequence.name,
            paragraphs.len(),
            pages.page_count(),
            pages.relayouts
        );
        Ok(PendingSequence {
            layout: SequenceLayout {
                name: sequence.name.clone(),
                paragraphs,
                placements,
                pages,
                anchors,
                citations: Vec::new(),
            },
            citations,
        })
    }
}

/// Number of the page holding the first box at or after `index`, or the last
/// page with content when nothing follows.
fn page_number_at(elements: &ElementSequence, pages: &PageLayout, index: usize) -> usize {
    let next_box = elements
        .elements()
        .get(index..)
        .and_then(|rest| rest.iter().position(Element::is_box))
        .map(|offset| index + offset);
    next_box
        .and_then(|i| pages.page_of(i))
        .or_else(|| pages.pages.iter().rev().find(|p| !p.span.is_empty()))
        .or_else(|| pages.pages.last())
        .map(|p| p.number)
        .unwrap_or_default()
}

/// A citation keeps the first text it is filled with.
fn fill_citation(slot: &OnceLock<String>, id: &str, text: String) {
    if slot.set(text).is_err() {
        debug!("Citation of '{}' already filled, keeping the first value.", id);
    }
}

struct PendingCitation {
    id: String,
    page_number: usize,
    slot: Arc<OnceLock<String>>,
}

struct PendingSequence {
    layout: SequenceLayout,
    citations: Vec<PendingCitation>,
}

impl PendingSequence {
    /// Reads the citation slots; only valid once the resolver has been finalized.
    fn finish(self) -> SequenceLayout {
        let PendingSequence {
            mut layout,
            citations,
        } = self;
        layout.citations = citations
            .into_iter()
            .map(|c| Citation {
                text: c
                    .slot
                    .get()
                    .cloned()
                    .unwrap_or_else(|| UNRESOLVED_PLACEHOLDER.to_string()),
                id: c.id,
                page_number: c.page_number,
            })
            .collect();
        layout
    }
}

enum MarkerKind {
    Anchor,
    Citation,
}

struct Marker {
    kind: MarkerKind,
    id: String,
    /// Flow length when the marker was seen.
    index: usize,
}

/// Spacing and keep owed to whatever follows the last item.
#[derive(Debug, Clone, Copy)]
struct Trailing {
    space_after: i32,
    keep_with_next: bool,
}

/// Accumulates one page sequence's page flow.
struct FlowBuilder<'a> {
    producer: &'a MonospaceProducer,
    line_breaker: &'a LineBreaker,
    elements: ElementSequence,
    footnotes: Vec<Footnote>,
    paragraphs: Vec<ParagraphLayout>,
    placements: Vec<LinePlacement>,
    markers: Vec<Marker>,
    trailing: Option<Trailing>,
    next_producer: u32,
}

impl<'a> FlowBuilder<'a> {
    fn new(producer: &'a MonospaceProducer, line_breaker: &'a LineBreaker) -> Self {
        Self {
            producer,
            line_breaker,
            elements: ElementSequence::new(),
            footnotes: Vec::new(),
            paragraphs: Vec::new(),
            placements: Vec::new(),
            markers: Vec::new(),
            trailing: None,
            next_producer: 0,
        }
    }

    fn push(&mut self, item: &FlowItem) -> Result<(), PipelineError> {
        match item {
            FlowItem::Paragraph(paragraph) => self.paragraph(paragraph)?,
            FlowItem::Block {
                height,
                keep_with_previous,
                keep_with_next,
            } => {
                self.separate(0, *keep_with_previous);
                let id = self.producer_id();
                self.elements.append(Element::boxed(*height).with_producer(id));
                self.trailing = Some(Trailing {
                    space_after: 0,
                    keep_with_next: *keep_with_next,
                });
            }
            FlowItem::PageBreak => {
                // Leading and repeated page breaks would only produce blank pages.
                if !self.elements.is_empty() && !self.elements.ends_with_forced_break() {
                    self.elements.append(Element::forced_break());
                }
                self.trailing = None;
            }
            FlowItem::Anchor { id } => self.mark(MarkerKind::Anchor, id),
            FlowItem::PageCitation { id } => self.mark(MarkerKind::Citation, id),
        }
        Ok(())
    }

    fn mark(&mut self, kind: MarkerKind, id: &str) {
        self.markers.push(Marker {
            kind,
            id: id.to_string(),
            index: self.elements.len(),
        });
    }

    fn producer_id(&mut self) -> ProducerId {
        let id = ProducerId(self.next_producer);
        self.next_producer += 1;
        id
    }

    /// Joins the previous item to the next one. A keep on either side forbids
    /// the break between them.
    fn separate(&mut self, space_before: i32, keep_with_previous: bool) {
        let Some(previous) = self.trailing.take() else {
            return;
        };
        let keep = previous.keep_with_next || keep_with_previous;
        if keep {
            self.elements.append(Element::forbidden_break());
        }
        let space = previous.space_after.saturating_add(space_before);
        if space > 0 {
            self.elements.append(Element::glue(space, space / 2, 0));
        } else if !keep {
            self.elements.append(Element::penalty(0, 0, false));
        }
    }

    fn paragraph(&mut self, paragraph_spec: &ParagraphSpec) -> Result<(), PipelineError> {
        let sequence = self.producer.produce_elements(&paragraph_spec.text)?;
        if sequence.is_empty() {
            debug!("Skipping blank paragraph");
            return Ok(());
        }
        let layout = self.line_breaker.break_paragraph(&sequence)?;

        self.separate(paragraph_spec.space_before, paragraph_spec.keep_with_previous);
        let id = self.producer_id();
        let paragraph = self.paragraphs.len();
        for line in 0..layout.line_count() {
            if line > 0 {
                self.elements.append(if paragraph_spec.keep_together {
                    Element::forbidden_break()
                } else {
                    Element::penalty(0, 0, false)
                });
            }
            let element = self.elements.len();
            if line == 0 {
                self.footnotes
                    .extend(paragraph_spec.footnotes.iter().map(|f| f.to_footnote(element)));
            }
            self.elements
                .append(Element::boxed(paragraph_spec.line_height).with_producer(id));
            self.placements.push(LinePlacement {
                element,
                paragraph,
                line,
            });
        }
        self.paragraphs.push(layout);
        self.trailing = Some(Trailing {
            space_after: paragraph_spec.space_after,
            keep_with_next: paragraph_spec.keep_with_next,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_layout::PageMaster;

    fn doc_with(flow: Vec<FlowItem>) -> DocumentSpec {
        DocumentSpec {
            page_masters: vec![PageMaster::new("body", 60_000, 36_000)],
            sequences: vec![PageSequenceSpec {
                name: "main".into(),
                master: "body".into(),
                initial_page_number: 1,
                flow,
            }],
            ..DocumentSpec::default()
        }
    }

    #[test]
    fn test_citation_keeps_its_first_page_number() {
        let slot = OnceLock::new();
        fill_citation(&slot, "intro", "3".to_string());
        fill_citation(&slot, "intro", "7".to_string());
        assert_eq!(slot.get().map(String::as_str), Some("3"));
    }

    #[test]
    fn test_flow_builder_encodes_keeps_and_spacing() {
        let producer = MonospaceProducer::new(6000);
        let breaker = LineBreaker::new(Default::default(), LineWidths::Constant(60_000));
        let mut builder = FlowBuilder::new(&producer, &breaker);
        builder
            .push(&FlowItem::Block {
                height: 10,
                keep_with_previous: false,
                keep_with_next: true,
            })
            .unwrap();
        builder
            .push(&FlowItem::Paragraph(ParagraphSpec {
                space_before: 4,
                ..ParagraphSpec::new("one")
            }))
            .unwrap();
        builder.push(&FlowItem::PageBreak).unwrap();
        builder.push(&FlowItem::PageBreak).unwrap();

        let elements = builder.elements.elements();
        assert_eq!(elements[0], Element::boxed(10).with_producer(ProducerId(0)));
        assert!(elements[1].is_forbidden_break());
        assert_eq!(elements[2], Element::glue(4, 2, 0));
        assert_eq!(elements[3], Element::boxed(12000).with_producer(ProducerId(1)));
        assert!(elements[4].is_forced_break());
        assert_eq!(elements.len(), 5);
    }

    #[test]
    fn test_markers_resolve_to_the_page_of_the_next_box() {
        let flow = vec![
            FlowItem::Block {
                height: 30_000,
                keep_with_previous: false,
                keep_with_next: false,
            },
            FlowItem::Anchor { id: "second".into() },
            FlowItem::Block {
                height: 30_000,
                keep_with_previous: false,
                keep_with_next: false,
            },
            FlowItem::PageCitation { id: "second".into() },
        ];
        let layout = Pipeline::new().run(&doc_with(flow)).unwrap();
        let sequence = &layout.sequences[0];
        assert_eq!(sequence.page_count(), 2);
        assert_eq!(sequence.anchors[0].page_number, 2);
        // Nothing follows the citation, so it sits on the last page.
        assert_eq!(sequence.citations[0].page_number, 2);
        assert_eq!(sequence.citations[0].text, "2");
        assert!(layout.unresolved.is_empty());
    }
}
