//! Arena storage for the nodes of one break search.
//!
//! Nodes never move once allocated and refer to their predecessor through a
//! `NodeHandle`, so a chain is walked by index without any shared ownership.

use folio_types::{Dimension, FitnessClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u32);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Running sums of widths, stretch and shrink from the start of the sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub width: i64,
    pub stretch: i64,
    pub shrink: i64,
}

impl Totals {
    pub fn add(&mut self, extent: Dimension) {
        self.width += i64::from(extent.opt);
        self.stretch += i64::from(extent.stretch());
        self.shrink += i64::from(extent.shrink());
    }
}

/// A feasible (or recovered) break together with the best path leading to it.
#[derive(Debug, Clone)]
pub struct ActiveNode<P> {
    /// Index of the break element, or of the first element for a root node.
    pub position: usize,
    /// First element that counts towards the next line or page.
    pub content_start: usize,
    /// Number of lines or pages ending at this node.
    pub line: usize,
    pub fitness: FitnessClass,
    /// Totals up to `content_start`.
    pub totals: Totals,
    pub adjustment_ratio: f64,
    pub difference: i64,
    pub available_stretch: i64,
    pub available_shrink: i64,
    pub total_demerits: f64,
    pub previous: Option<NodeHandle>,
    /// Strategy state carried along the chain (footnotes placed, master used).
    pub payload: P,
}

impl<P> ActiveNode<P> {
    pub fn is_root(&self) -> bool {
        self.previous.is_none()
    }

    /// True when the content of this line or page cannot shrink enough.
    pub fn is_overfull(&self) -> bool {
        self.difference < 0 && -self.difference > self.available_shrink
    }
}

#[derive(Debug, Clone)]
pub struct NodeArena<P> {
    nodes: Vec<ActiveNode<P>>,
}

impl<P> Default for NodeArena<P> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<P> NodeArena<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: ActiveNode<P>) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(node);
        handle
    }

    pub fn get(&self, handle: NodeHandle) -> &ActiveNode<P> {
        &self.nodes[handle.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handles from `terminal` back to the root, terminal first.
    pub fn chain(&self, terminal: NodeHandle) -> Chain<'_, P> {
        Chain {
            arena: self,
            next: Some(terminal),
        }
    }
}

pub struct Chain<'a, P> {
    arena: &'a NodeArena<P>,
    next: Option<NodeHandle>,
}

impl<'a, P> Iterator for Chain<'a, P> {
    type Item = (NodeHandle, &'a ActiveNode<P>);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.next?;
        let node = self.arena.get(handle);
        self.next = node.previous;
        Some((handle, node))
    }
}
