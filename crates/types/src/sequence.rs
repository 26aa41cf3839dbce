//! Ordered element lists consumed by the break search.
use crate::dimension::Dimension;
use crate::element::Element;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An ordered list of elements for one flow (a paragraph or a run of blocks).
///
/// Producers build it with `append`; the breaking engine only ever reads it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ElementSequence {
    elements: Vec<Element>,
}

impl ElementSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn element_at(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// A penalty with a finite cost, or glue directly after a box.
    pub fn is_legal_break(&self, index: usize) -> bool {
        match self.elements.get(index) {
            Some(Element::Penalty { .. }) => !self.elements[index].is_forbidden_break(),
            Some(Element::Glue { .. }) => {
                index > 0 && self.elements[index - 1].is_box()
            }
            _ => false,
        }
    }

    pub fn is_forced_break(&self, index: usize) -> bool {
        self.elements
            .get(index)
            .is_some_and(|e| e.is_forced_break())
    }

    pub fn ends_with_forced_break(&self) -> bool {
        self.elements.last().is_some_and(|e| e.is_forced_break())
    }

    /// Appends the standard flow ending: a forbidden break, fill glue and a
    /// forced break, so the last line or page may run short. Does nothing if the
    /// sequence already ends in a forced break.
    pub fn terminate(&mut self) {
        if self.ends_with_forced_break() {
            return;
        }
        self.elements.push(Element::forbidden_break());
        self.elements.push(Element::fill());
        self.elements.push(Element::forced_break());
    }

    /// A bounded view over `range`, clamped to the sequence length.
    pub fn range(&self, range: Range<usize>) -> ElementRange<'_> {
        let end = range.end.min(self.elements.len());
        let start = range.start.min(end);
        ElementRange {
            elements: &self.elements,
            start,
            end,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }
}

impl From<Vec<Element>> for ElementSequence {
    fn from(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

impl FromIterator<Element> for ElementSequence {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ElementSequence {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// A read-only window `[start, end)` into a sequence, with absolute indices.
#[derive(Debug, Clone, Copy)]
pub struct ElementRange<'a> {
    elements: &'a [Element],
    start: usize,
    end: usize,
}

impl<'a> ElementRange<'a> {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_slice(&self) -> &'a [Element] {
        &self.elements[self.start..self.end]
    }

    /// Iterates `(absolute index, element)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Element)> + 'a {
        let start = self.start;
        self.as_slice()
            .iter()
            .enumerate()
            .map(move |(offset, e)| (start + offset, e))
    }

    /// Index of the first element that is not discarded at the start of a line or
    /// page: glue and non-forced penalties after a break are dropped until the
    /// first box.
    pub fn content_start(&self) -> usize {
        self.iter()
            .find(|(_, e)| e.is_box() || e.is_forced_break())
            .map(|(i, _)| i)
            .unwrap_or(self.end)
    }

    /// Sum of the extents in the range, plus the break width of the last element
    /// when it is a penalty (the break that terminates the range).
    pub fn natural_extent(&self) -> Dimension {
        let mut total = Dimension::ZERO;
        for (_, element) in self.iter() {
            total += element.extent();
        }
        if let Some(last) = self.as_slice().last() {
            total += Dimension::fixed(last.break_width());
        }
        total
    }

    /// Iterates the boxes of the range.
    pub fn boxes(&self) -> impl Iterator<Item = (usize, &'a Element)> + 'a {
        self.iter().filter(|(_, e)| e.is_box())
    }
}
