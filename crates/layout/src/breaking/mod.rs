pub mod algorithm;
pub mod materialize;
pub mod node;

pub use algorithm::{
    Assessment, BreakResult, BreakStrategy, BreakingAlgorithm, Candidate, INFINITE_RATIO,
    SearchStart, adjustment_ratio,
};
pub use materialize::{Materialized, materialize, ordered_chain, overflow_event, span_between};
pub use node::{ActiveNode, NodeArena, NodeHandle, Totals};
