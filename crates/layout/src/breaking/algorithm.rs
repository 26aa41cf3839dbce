//! Generalized Knuth–Plass search shared by the line and page passes.
//!
//! The search walks the sequence once, keeping a set of active nodes (breaks
//! that can still start a feasible line or page). Every legal break is tried
//! against every active node; the cheapest path per fitness class survives as a
//! new node. What "available space" means is left to a [`BreakStrategy`], which
//! is the only difference between breaking lines and breaking pages.

use super::node::{ActiveNode, NodeArena, NodeHandle, Totals};
use crate::LayoutError;
use crate::config::BreakingConfig;
use folio_types::{Element, ElementSequence, FitnessClass, INFINITE};
use log::{debug, trace};
use std::fmt::Debug;

/// Ratio reported when a line must stretch or shrink but has nothing to do it with.
pub const INFINITE_RATIO: f64 = 1000.0;

const MAX_BADNESS: f64 = 10_000.0;
const MIN_ACTIVE_NODES: usize = 64;

/// One candidate line or page: content from `from` up to and including the
/// break at `break_index`.
pub struct Candidate<'a, P> {
    pub from: &'a ActiveNode<P>,
    pub break_index: usize,
    /// Number the candidate would get (1-based, continues `from.line`).
    pub line: usize,
    /// Natural extent of the content, including the break width.
    pub natural: i64,
}

/// A strategy's verdict on a candidate.
#[derive(Debug, Clone)]
pub struct Assessment<P> {
    pub available: i64,
    pub extra_stretch: i64,
    pub extra_shrink: i64,
    pub extra_demerits: f64,
    pub payload: P,
}

impl<P> Assessment<P> {
    pub fn new(available: i64, payload: P) -> Self {
        Self {
            available,
            extra_stretch: 0,
            extra_shrink: 0,
            extra_demerits: 0.0,
            payload,
        }
    }
}

/// Specialization hooks of the search.
///
/// Implementations decide how much room a line or page has and may add
/// demerits of their own. They are called once per (active node, legal break)
/// pair, in sequence order.
pub trait BreakStrategy {
    type Payload: Clone + Debug;

    fn assess(
        &mut self,
        sequence: &ElementSequence,
        candidate: &Candidate<'_, Self::Payload>,
    ) -> Result<Assessment<Self::Payload>, LayoutError>;

    /// True when the available space depends on the line or page number, so
    /// nodes of different lines must not compete with each other.
    fn varies_by_line(&self) -> bool {
        false
    }
}

/// Where a search begins. A fresh search starts at index 0 on line 0; a
/// re-search continues an earlier chain.
#[derive(Debug, Clone)]
pub struct SearchStart<P> {
    pub index: usize,
    pub line: usize,
    pub fitness: FitnessClass,
    pub demerits: f64,
    pub payload: P,
}

impl<P> SearchStart<P> {
    pub fn fresh(payload: P) -> Self {
        Self {
            index: 0,
            line: 0,
            fitness: FitnessClass::Decent,
            demerits: 0.0,
            payload,
        }
    }
}

/// The arena of a finished search and the node its best chain ends in.
#[derive(Debug)]
pub struct BreakResult<P> {
    pub arena: NodeArena<P>,
    pub terminal: NodeHandle,
    /// How often the search had to restart from a too-short or too-long node.
    pub restarts: usize,
}

impl<P> BreakResult<P> {
    pub fn terminal_node(&self) -> &ActiveNode<P> {
        self.arena.get(self.terminal)
    }

    pub fn demerits(&self) -> f64 {
        self.terminal_node().total_demerits
    }

    /// Line (or page) number of the last span.
    pub fn lines(&self) -> usize {
        self.terminal_node().line
    }
}

struct SearchState<P> {
    arena: NodeArena<P>,
    active: Vec<NodeHandle>,
    too_short: Option<ActiveNode<P>>,
    too_long: Option<ActiveNode<P>>,
    last_restart: usize,
    restarts: usize,
}

impl<P> SearchState<P> {
    /// Re-seeds the active set after it ran empty. Returns the index to resume
    /// scanning from.
    fn recover(&mut self) -> Option<usize> {
        let short = self.too_short.take();
        let long = self.too_long.take();
        let node = match short {
            Some(node) if node.position != self.last_restart => node,
            _ => long?,
        };
        debug!(
            "Restarting search at element {} (line {}, ratio {:.3}).",
            node.position, node.line, node.adjustment_ratio
        );
        let resume = node.position + 1;
        self.last_restart = node.position;
        self.restarts += 1;
        let handle = self.arena.alloc(node);
        self.active.push(handle);
        Some(resume)
    }

    fn sort_active(&mut self) {
        let arena = &self.arena;
        self.active.sort_by_key(|h| (arena.get(*h).line, *h));
    }
}

pub struct BreakingAlgorithm<'a, S: BreakStrategy> {
    sequence: &'a ElementSequence,
    config: BreakingConfig,
    strategy: &'a mut S,
    allow_flagged: bool,
    /// `totals[i]` sums the extents of elements `0..i`.
    totals: Vec<Totals>,
}

impl<'a, S: BreakStrategy> BreakingAlgorithm<'a, S> {
    pub fn new(sequence: &'a ElementSequence, config: BreakingConfig, strategy: &'a mut S) -> Self {
        let mut totals = Vec::with_capacity(sequence.len() + 1);
        let mut running = Totals::default();
        totals.push(running);
        for element in sequence {
            running.add(element.extent());
            totals.push(running);
        }
        Self {
            sequence,
            config,
            strategy,
            allow_flagged: true,
            totals,
        }
    }

    /// Whether flagged penalties (hyphenation points) count as legal breaks.
    pub fn allow_flagged_breaks(mut self, allow: bool) -> Self {
        self.allow_flagged = allow;
        self
    }

    /// Runs the search from `start` to the end of the sequence.
    ///
    /// With `force` off, returns `Ok(None)` as soon as no feasible break is
    /// left. With `force` on, the search recovers from dead ends and always
    /// yields a chain, possibly with overfull spans.
    pub fn find_breaks(
        &mut self,
        start: SearchStart<S::Payload>,
        force: bool,
    ) -> Result<Option<BreakResult<S::Payload>>, LayoutError> {
        let len = self.sequence.len();
        if len == 0 {
            return Err(LayoutError::EmptySequence);
        }
        if start.index >= len {
            return Err(LayoutError::InvalidStart(start.index));
        }

        let mut state = SearchState {
            arena: NodeArena::new(),
            active: Vec::new(),
            too_short: None,
            too_long: None,
            last_restart: start.index,
            restarts: 0,
        };
        // A continued search starts right after a break, where leading glue
        // and penalties vanish like they do after any other break.
        let content_start = if start.index == 0 {
            0
        } else {
            self.first_content_at(start.index)
        };
        let root = state.arena.alloc(ActiveNode {
            position: start.index,
            content_start,
            line: start.line,
            fitness: start.fitness,
            totals: self.totals[content_start],
            adjustment_ratio: 0.0,
            difference: 0,
            available_stretch: 0,
            available_shrink: 0,
            total_demerits: start.demerits,
            previous: None,
            payload: start.payload,
        });
        state.active.push(root);

        let sequence = self.sequence;
        let elements = sequence.elements();
        let mut index = start.index;
        while index < len {
            let element = &elements[index];
            let is_end = index + 1 == len;
            if is_end || self.is_usable_break(index, element) {
                let forced = is_end || element.is_forced_break();
                self.consider_break(&mut state, index, forced)?;
            }

            if state.active.is_empty() {
                if !force {
                    debug!("No feasible break left at element {}, giving up.", index);
                    return Ok(None);
                }
                match state.recover() {
                    Some(resume) => {
                        index = resume;
                        continue;
                    }
                    None => {
                        return Err(LayoutError::Generic(format!(
                            "break search lost every active node at element {}",
                            index
                        )));
                    }
                }
            }
            index += 1;
        }

        let terminal = self.select_terminal(&state).ok_or_else(|| {
            LayoutError::Generic("break search ended without a finalist".to_string())
        })?;
        let chosen = state.arena.get(terminal);
        debug!(
            "Break search finished: {} lines, {:.1} demerits, {} nodes, {} restarts.",
            chosen.line,
            chosen.total_demerits,
            state.arena.len(),
            state.restarts
        );
        Ok(Some(BreakResult {
            arena: state.arena,
            terminal,
            restarts: state.restarts,
        }))
    }

    fn is_usable_break(&self, index: usize, element: &Element) -> bool {
        self.sequence.is_legal_break(index)
            && (self.allow_flagged || !element.is_flagged() || element.is_forced_break())
    }

    /// First box or forced break at or after `index`.
    fn first_content_at(&self, index: usize) -> usize {
        let elements = self.sequence.elements();
        let mut next = index;
        while next < elements.len() && !(elements[next].is_box() || elements[next].is_forced_break())
        {
            next += 1;
        }
        next
    }

    /// First element after the break at `index` that starts the next line, and
    /// the totals up to it. Glue and penalties directly after a break vanish.
    fn totals_after(&self, index: usize) -> (usize, Totals) {
        let next = self.first_content_at(index + 1);
        (next, self.totals[next])
    }

    fn consider_break(
        &mut self,
        state: &mut SearchState<S::Payload>,
        index: usize,
        forced: bool,
    ) -> Result<(), LayoutError> {
        let sequence = self.sequence;
        let element = &sequence.elements()[index];
        let break_totals = if element.is_box() {
            self.totals[index + 1]
        } else {
            self.totals[index]
        };
        let break_width = i64::from(element.break_width());
        let (content_start, after) = self.totals_after(index);
        let group_by_line = self.strategy.varies_by_line() || self.config.looseness != 0;

        // Only overfull candidates of this break are restart material.
        state.too_long = None;
        let active = std::mem::take(&mut state.active);
        let mut survivors = Vec::with_capacity(active.len());
        let mut created: Vec<ActiveNode<S::Payload>> = Vec::new();
        let mut cursor = 0;

        while cursor < active.len() {
            let group_line = state.arena.get(active[cursor]).line;
            let mut best: [Option<ActiveNode<S::Payload>>; 4] = std::array::from_fn(|_| None);

            while cursor < active.len()
                && (!group_by_line || state.arena.get(active[cursor]).line == group_line)
            {
                let handle = active[cursor];
                cursor += 1;
                let node = state.arena.get(handle);
                if !forced && node.content_start > index {
                    survivors.push(handle);
                    continue;
                }

                let natural = (break_totals.width - node.totals.width).max(0) + break_width;
                let candidate = Candidate {
                    from: node,
                    break_index: index,
                    line: node.line + 1,
                    natural,
                };
                let assessment = self.strategy.assess(sequence, &candidate)?;
                let difference = assessment.available - natural;
                let stretch =
                    (break_totals.stretch - node.totals.stretch).max(0) + assessment.extra_stretch;
                let shrink =
                    (break_totals.shrink - node.totals.shrink).max(0) + assessment.extra_shrink;
                let ratio = adjustment_ratio(difference, stretch, shrink);
                let fitness = FitnessClass::classify(ratio);
                let demerits = node.total_demerits
                    + self.line_demerits(node, element, ratio, fitness)
                    + assessment.extra_demerits;
                trace!(
                    "Candidate {}..={} (line {}): diff {}, ratio {:.3}, demerits {:.1}",
                    node.position, index, candidate.line, difference, ratio, demerits
                );

                let successor = ActiveNode {
                    position: index,
                    content_start,
                    line: node.line + 1,
                    fitness,
                    totals: after,
                    adjustment_ratio: ratio,
                    difference,
                    available_stretch: stretch,
                    available_shrink: shrink,
                    total_demerits: demerits,
                    previous: Some(handle),
                    payload: assessment.payload,
                };

                if ratio < -1.0 {
                    if state
                        .too_long
                        .as_ref()
                        .is_none_or(|n| demerits < n.total_demerits)
                    {
                        state.too_long = Some(successor);
                    }
                } else if ratio > self.config.tolerance {
                    if state
                        .too_short
                        .as_ref()
                        .is_none_or(|n| demerits <= n.total_demerits)
                    {
                        state.too_short = Some(successor);
                    }
                } else {
                    let slot = &mut best[fitness.index()];
                    if slot.as_ref().is_none_or(|n| demerits < n.total_demerits) {
                        *slot = Some(successor);
                        // A feasible break supersedes every earlier underfull one.
                        state.too_short = None;
                    }
                }

                if !(forced || ratio < -1.0) {
                    survivors.push(handle);
                }
            }

            let minimum = best
                .iter()
                .flatten()
                .map(|n| n.total_demerits)
                .fold(f64::INFINITY, f64::min);
            created.extend(best.into_iter().flatten().filter(|n| {
                n.total_demerits <= minimum + self.config.incompatible_fitness_demerit
            }));
        }

        for node in created {
            debug!(
                "Break at element {} (line {}, {:?}, ratio {:.3}, demerits {:.1}).",
                node.position, node.line, node.fitness, node.adjustment_ratio, node.total_demerits
            );
            survivors.push(state.arena.alloc(node));
        }
        state.active = survivors;
        state.sort_active();
        self.enforce_lookahead(state);
        Ok(())
    }

    fn line_demerits(
        &self,
        from: &ActiveNode<S::Payload>,
        element: &Element,
        ratio: f64,
        fitness: FitnessClass,
    ) -> f64 {
        let badness = (100.0 * ratio.abs().powi(3)).min(MAX_BADNESS);
        let base = self.config.line_penalty + badness;
        let cost = f64::from(element.cost());
        let mut demerits = if cost >= 0.0 {
            (base + cost).powi(2)
        } else if cost > -f64::from(INFINITE) {
            base * base - cost * cost
        } else {
            base * base
        };

        let previous_flagged = !from.is_root()
            && self
                .sequence
                .element_at(from.position)
                .is_some_and(Element::is_flagged);
        if element.is_flagged() && previous_flagged {
            demerits += self.config.repeated_flagged_demerit;
        }
        if fitness.is_incompatible_with(from.fitness) {
            demerits += self.config.incompatible_fitness_demerit;
        }
        demerits
    }

    /// Drops the most expensive nodes once the active set outgrows its bound.
    fn enforce_lookahead(&self, state: &mut SearchState<S::Payload>) {
        let highest = state
            .active
            .iter()
            .map(|h| state.arena.get(*h).line)
            .max()
            .unwrap_or(0);
        let cap = MIN_ACTIVE_NODES.max(self.config.lookahead_factor.saturating_mul(highest + 1));
        if state.active.len() <= cap {
            return;
        }
        let arena = &state.arena;
        state.active.sort_by(|a, b| {
            arena
                .get(*a)
                .total_demerits
                .total_cmp(&arena.get(*b).total_demerits)
                .then(a.cmp(b))
        });
        trace!("Pruning {} active nodes.", state.active.len() - cap);
        state.active.truncate(cap);
        state.sort_active();
    }

    fn select_terminal(&self, state: &SearchState<S::Payload>) -> Option<NodeHandle> {
        let arena = &state.arena;
        let best = state.active.iter().copied().min_by(|a, b| {
            let (na, nb) = (arena.get(*a), arena.get(*b));
            na.total_demerits
                .total_cmp(&nb.total_demerits)
                .then(na.line.cmp(&nb.line))
                .then(a.cmp(b))
        })?;
        if self.config.looseness == 0 {
            return Some(best);
        }

        let target = arena.get(best).line as i64 + i64::from(self.config.looseness);
        state.active.iter().copied().min_by(|a, b| {
            let (na, nb) = (arena.get(*a), arena.get(*b));
            (na.line as i64 - target)
                .abs()
                .cmp(&(nb.line as i64 - target).abs())
                .then(na.total_demerits.total_cmp(&nb.total_demerits))
                .then(a.cmp(b))
        })
    }
}

/// Knuth's adjustment ratio: how far the available stretch (or shrink) must be
/// used to absorb `difference`.
pub fn adjustment_ratio(difference: i64, stretch: i64, shrink: i64) -> f64 {
    if difference > 0 {
        if stretch > 0 {
            difference as f64 / stretch as f64
        } else {
            INFINITE_RATIO
        }
    } else if difference < 0 {
        if shrink > 0 {
            difference as f64 / shrink as f64
        } else {
            -INFINITE_RATIO
        }
    } else {
        0.0
    }
}
