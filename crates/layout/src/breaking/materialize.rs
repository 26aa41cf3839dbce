//! Turns the chain ending in a terminal node into ordered spans.

use super::node::{ActiveNode, NodeArena, NodeHandle};
use crate::events::LayoutEvent;
use folio_types::ResolvedSpan;
use log::warn;

/// Nodes of the chain ending in `terminal`, root first.
pub fn ordered_chain<P>(arena: &NodeArena<P>, terminal: NodeHandle) -> Vec<&ActiveNode<P>> {
    let mut chain: Vec<&ActiveNode<P>> = arena.chain(terminal).map(|(_, node)| node).collect();
    chain.reverse();
    chain
}

/// The span covered by `node`, which follows `previous` in its chain.
pub fn span_between<P>(previous: &ActiveNode<P>, node: &ActiveNode<P>) -> ResolvedSpan {
    let start = if previous.is_root() {
        previous.position
    } else {
        previous.position + 1
    };
    ResolvedSpan {
        start,
        end: node.position + 1,
        line: node.line,
        adjustment_ratio: node.adjustment_ratio,
        fitness: node.fitness,
        difference: node.difference.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
    }
}

/// Spans of the chain plus an overflow event for every span that cannot
/// shrink enough.
#[derive(Debug, Clone, Default)]
pub struct Materialized {
    pub spans: Vec<ResolvedSpan>,
    pub events: Vec<LayoutEvent>,
}

pub fn materialize<P>(arena: &NodeArena<P>, terminal: NodeHandle) -> Materialized {
    let chain = ordered_chain(arena, terminal);
    let mut result = Materialized {
        spans: Vec::with_capacity(chain.len().saturating_sub(1)),
        events: Vec::new(),
    };
    for pair in chain.windows(2) {
        let (previous, node) = (pair[0], pair[1]);
        let span = span_between(previous, node);
        if let Some(event) = overflow_event(&span, node.available_shrink) {
            result.events.push(event);
        }
        result.spans.push(span);
    }
    result
}

/// An overflow event for `span` if its content exceeds the available space
/// even after using all of `available_shrink`.
pub fn overflow_event(span: &ResolvedSpan, available_shrink: i64) -> Option<LayoutEvent> {
    let difference = i64::from(span.difference);
    if difference >= 0 || -difference <= available_shrink {
        return None;
    }
    let amount = -difference - available_shrink;
    warn!(
        "Content {}..{} overflows line {} by {} even at full shrink.",
        span.start, span.end, span.line, amount
    );
    Some(LayoutEvent::ContentOverflow {
        start: span.start,
        end: span.end,
        line: span.line,
        amount,
    })
}
