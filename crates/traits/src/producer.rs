//! ElementProducer trait for abstracting content-to-element translation.
//!
//! The breaking engine never looks at markup, styles or fonts. Whatever owns
//! that state turns it into an `ElementSequence` with fully resolved widths.

use folio_types::ElementSequence;
use std::fmt::Debug;
use thiserror::Error;

/// Error type for element production.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProducerError {
    #[error("Content cannot be measured: {0}")]
    Unmeasurable(String),

    #[error("Producer '{producer}' rejected content: {message}")]
    Rejected {
        producer: &'static str,
        message: String,
    },
}

/// Translates one content node into the elements of a single flow.
///
/// Implementations must resolve every box width up front; the break search does
/// no style lookups of its own.
///
/// # Example
///
/// ```ignore
/// let producer = MonospaceProducer::new(600);
/// let mut paragraph = producer.produce_elements("Hello world")?;
/// paragraph.terminate();
/// ```
pub trait ElementProducer: Send + Sync + Debug {
    type Content: ?Sized;

    fn produce_elements(&self, content: &Self::Content) -> Result<ElementSequence, ProducerError>;

    /// Returns a human-readable name for this producer (for logging/debugging).
    fn name(&self) -> &'static str;
}
