//! A fixed-advance text producer.
//!
//! Every character has the same width, which keeps measurements exact and makes
//! the demo and the tests independent of font files. Words become boxes, runs of
//! whitespace become one glue, and soft hyphens (U+00AD) become flagged penalties
//! carrying the width of the hyphen they would show.

use folio_traits::{ElementProducer, ProducerError};
use folio_types::{Element, ElementSequence};

pub const SOFT_HYPHEN: char = '\u{00AD}';

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceProducer {
    /// Width of every character, in millipoints.
    pub advance: i32,
    /// Width of the hyphen shown at a flagged break.
    pub hyphen_width: i32,
    /// Cost of breaking at a soft hyphen.
    pub flagged_penalty: i32,
}

impl MonospaceProducer {
    pub fn new(advance: i32) -> Self {
        Self {
            advance,
            hyphen_width: advance,
            flagged_penalty: 50,
        }
    }

    pub fn with_flagged_penalty(mut self, cost: i32) -> Self {
        self.flagged_penalty = cost;
        self
    }

    fn width_of(&self, chars: usize) -> Result<i32, ProducerError> {
        i32::try_from(chars)
            .ok()
            .and_then(|n| n.checked_mul(self.advance))
            .ok_or_else(|| ProducerError::Unmeasurable(format!("{} characters", chars)))
    }

    /// Space glue stretches by half an advance and shrinks by a third.
    fn space(&self) -> Element {
        Element::glue(self.advance, self.advance / 2, self.advance / 3)
    }

    fn push_word(&self, word: &str, out: &mut ElementSequence) -> Result<(), ProducerError> {
        let mut fragments = word.split(SOFT_HYPHEN).filter(|f| !f.is_empty()).peekable();
        while let Some(fragment) = fragments.next() {
            out.append(Element::boxed(self.width_of(fragment.chars().count())?));
            if fragments.peek().is_some() {
                out.append(Element::penalty(
                    self.hyphen_width,
                    self.flagged_penalty,
                    true,
                ));
            }
        }
        Ok(())
    }
}

impl ElementProducer for MonospaceProducer {
    type Content = str;

    /// Produces a terminated paragraph, or an empty sequence for blank text.
    fn produce_elements(&self, text: &str) -> Result<ElementSequence, ProducerError> {
        if self.advance <= 0 {
            return Err(ProducerError::Rejected {
                producer: self.name(),
                message: format!("advance must be positive, got {}", self.advance),
            });
        }
        let mut out = ElementSequence::new();
        for word in text.split_whitespace() {
            // Nothing but soft hyphens: no box, so no space either.
            if word.split(SOFT_HYPHEN).all(str::is_empty) {
                continue;
            }
            if !out.is_empty() {
                out.append(self.space());
            }
            self.push_word(word, &mut out)?;
        }
        if !out.is_empty() {
            out.terminate();
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "MonospaceProducer"
    }
}
