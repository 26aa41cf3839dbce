pub mod area;
pub mod producer;

pub use area::{AreaError, AreaSink, CollectingSink};
pub use producer::{ElementProducer, ProducerError};
