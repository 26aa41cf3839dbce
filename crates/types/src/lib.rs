pub mod dimension;
pub mod element;
pub mod ids;
pub mod sequence;
pub mod span;

pub use dimension::Dimension;
pub use element::{Element, FILL_STRETCH, INFINITE};
pub use ids::{ProducerId, RefId};
pub use sequence::{ElementRange, ElementSequence};
pub use span::{FitnessClass, ResolvedSpan};
