mod common;

use common::fixtures::{CHAR, MEASURE};
use common::{TestResult, init_logger};
use folio::layout::{LineBreaker, LineBreakingConfig, LineWidths, TextAlign};
use folio::traits::ElementProducer;
use folio::types::FitnessClass;
use folio::MonospaceProducer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn breaker(config: LineBreakingConfig) -> LineBreaker {
    LineBreaker::new(config, LineWidths::Constant(MEASURE))
}

fn random_text(rng: &mut StdRng, words: usize) -> String {
    (0..words)
        .map(|_| {
            let len = rng.random_range(1..9);
            "x".repeat(len)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_produced_paragraph_breaks_into_justified_lines() -> TestResult {
    init_logger();
    let producer = MonospaceProducer::new(10);
    // Three 40-wide words, spaces of 10 that stretch by 5: the first line stretches fully.
    let seq = producer.produce_elements("aaaa aaaa aaaa")?;
    let layout = LineBreaker::new(LineBreakingConfig::default(), LineWidths::Constant(95))
        .break_paragraph(&seq)?;

    assert_eq!(layout.line_count(), 2);
    assert_eq!(layout.pass, 1);
    assert_eq!(layout.lines[0].span.break_index(), 3);
    assert_eq!(layout.lines[0].span.adjustment_ratio, 1.0);
    assert_eq!(layout.lines[0].span.fitness, FitnessClass::Loose);
    assert!(layout.events.is_empty());
    Ok(())
}

#[test]
fn test_random_text_is_tiled_without_gaps() -> TestResult {
    let producer = MonospaceProducer::new(CHAR);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let seq = producer.produce_elements(&random_text(&mut rng, 60))?;
        let layout = breaker(LineBreakingConfig::default()).break_paragraph(&seq)?;

        let mut expected_start = 0;
        for line in &layout.lines {
            assert_eq!(line.span.start, expected_start);
            assert!(line.span.end > line.span.start);
            expected_start = line.span.end;
        }
        assert_eq!(expected_start, seq.len());
        // Words never exceed the measure, so nothing overflows.
        assert!(layout.events.is_empty());
    }
    Ok(())
}

#[test]
fn test_line_pass_is_deterministic() -> TestResult {
    let producer = MonospaceProducer::new(CHAR);
    let mut rng = StdRng::seed_from_u64(9);
    let text = random_text(&mut rng, 200);
    let seq = producer.produce_elements(&text)?;
    let first = breaker(LineBreakingConfig::default()).break_paragraph(&seq)?;
    let second = breaker(LineBreakingConfig::default()).break_paragraph(&seq)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_soft_hyphens_are_only_used_when_needed() -> TestResult {
    let producer = MonospaceProducer::new(CHAR);
    // "aaaa bbbbb" fills a line exactly; the soft hyphen is never needed.
    let seq = producer.produce_elements("aaaa bbbbb aa\u{00AD}aa bbbbb")?;
    let layout = breaker(LineBreakingConfig::default()).break_paragraph(&seq)?;
    assert_eq!(layout.line_count(), 2);
    assert!(layout.lines.iter().all(|l| !l.hyphenated));

    // One long hyphenated word must be split at its soft hyphen.
    let seq = producer.produce_elements("aaaaaaaa\u{00AD}bbbbbbbb")?;
    let layout = breaker(LineBreakingConfig::default()).break_paragraph(&seq)?;
    assert_eq!(layout.pass, 2);
    assert_eq!(layout.line_count(), 2);
    assert!(layout.lines[0].hyphenated);
    Ok(())
}

#[test]
fn test_word_wider_than_the_measure_overflows() -> TestResult {
    let producer = MonospaceProducer::new(CHAR);
    let seq = producer.produce_elements("supercalifragilistic")?;
    let layout = breaker(LineBreakingConfig::default()).break_paragraph(&seq)?;
    assert_eq!(layout.line_count(), 1);
    assert_eq!(layout.events.len(), 1);
    assert!(layout.events[0].is_overflow());
    Ok(())
}

#[test]
fn test_ragged_alignment_offsets_lines() -> TestResult {
    let producer = MonospaceProducer::new(CHAR);
    let seq = producer.produce_elements("aaaa bbbbb cc")?;
    let config = LineBreakingConfig {
        text_align: TextAlign::End,
        ..LineBreakingConfig::default()
    };
    let layout = breaker(config).break_paragraph(&seq)?;
    assert_eq!(layout.line_count(), 2);
    assert_eq!(layout.lines[0].offset, 0);
    // "cc" is two characters wide; the rest of the measure goes before it.
    assert_eq!(layout.lines[1].offset, MEASURE - 2 * CHAR);
    Ok(())
}
