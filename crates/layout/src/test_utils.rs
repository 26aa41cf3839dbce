use crate::LayoutError;
use crate::breaking::{
    Assessment, BreakResult, BreakStrategy, BreakingAlgorithm, Candidate, SearchStart,
};
use crate::config::BreakingConfig;
use folio_types::{Element, ElementSequence, ResolvedSpan};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every line has the same width.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidth(pub i64);

impl BreakStrategy for FixedWidth {
    type Payload = ();

    fn assess(
        &mut self,
        _sequence: &ElementSequence,
        _candidate: &Candidate<'_, ()>,
    ) -> Result<Assessment<()>, LayoutError> {
        Ok(Assessment::new(self.0, ()))
    }
}

pub fn search(
    sequence: &ElementSequence,
    width: i64,
    config: BreakingConfig,
    force: bool,
) -> Option<BreakResult<()>> {
    let mut strategy = FixedWidth(width);
    BreakingAlgorithm::new(sequence, config, &mut strategy)
        .find_breaks(SearchStart::fresh(()), force)
        .unwrap()
}

/// Words of the given widths joined by interword glue, then terminated.
pub fn words(widths: &[i32], space: (i32, i32, i32)) -> ElementSequence {
    let mut seq = ElementSequence::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            seq.append(Element::glue(space.0, space.1, space.2));
        }
        seq.append(Element::boxed(*width));
    }
    seq.terminate();
    seq
}

/// Block boxes separated by zero-cost penalties, then terminated.
pub fn blocks(heights: &[i32]) -> ElementSequence {
    let mut seq = ElementSequence::new();
    for (i, height) in heights.iter().enumerate() {
        if i > 0 {
            seq.append(Element::penalty(0, 0, false));
        }
        seq.append(Element::boxed(*height));
    }
    seq.terminate();
    seq
}

/// A random paragraph of `count` words, with occasional hyphenation points and
/// forced breaks.
pub fn random_paragraph(rng: &mut StdRng, count: usize) -> ElementSequence {
    let mut seq = ElementSequence::new();
    for i in 0..count {
        if i > 0 {
            match rng.random_range(0..20) {
                0 => seq.append(Element::forced_break()),
                1 => seq.append(Element::penalty(6, 50, true)),
                _ => seq.append(Element::glue(10, rng.random_range(0..8), rng.random_range(0..4))),
            }
        }
        seq.append(Element::boxed(rng.random_range(5..80)));
    }
    seq.terminate();
    seq
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Spans must tile `start..len` without gaps or overlaps.
pub fn assert_tiles(spans: &[ResolvedSpan], start: usize, len: usize) {
    assert!(!spans.is_empty(), "no spans");
    assert_eq!(spans[0].start, start, "first span starts late");
    for pair in spans.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "gap or overlap between {:?} and {:?}", pair[0], pair[1]);
    }
    assert_eq!(spans[spans.len() - 1].end, len, "last span ends early");
}
