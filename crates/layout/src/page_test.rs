#![cfg(test)]

use crate::config::PageBreakingConfig;
use crate::events::LayoutEvent;
use crate::page::{Footnote, PageBreaker, PageFlow, PageLayout};
use crate::page_master::{
    BlankOrNotBlank, ConditionalMaster, OddOrEven, PageMaster, PagePosition, PageSequenceMaster,
    SequenceMasterPolicy, SubSequence,
};
use crate::test_utils::{assert_tiles, blocks, init_logger};
use crate::LayoutError;
use folio_types::{Element, ElementSequence, ProducerId, ResolvedSpan};

fn paginate(flow: &PageFlow, height: i32) -> PageLayout {
    let master = PageMaster::new("body", 400, height);
    PageBreaker::new(PageBreakingConfig::default(), &master)
        .break_pages(flow)
        .unwrap()
}

fn spans(layout: &PageLayout) -> Vec<ResolvedSpan> {
    layout.pages.iter().map(|p| p.span).collect()
}

#[test]
fn test_blocks_that_fit_stay_on_one_page() {
    init_logger();
    let flow = PageFlow::new(blocks(&[80, 80, 80]));
    let layout = paginate(&flow, 250);
    assert_eq!(layout.page_count(), 1);
    assert_eq!(layout.pages[0].master, "body");
    assert_eq!(layout.pages[0].number, 1);
    assert!(layout.events.is_empty());
}

#[test]
fn test_footnote_reserves_space_on_its_citation_page() {
    init_logger();
    let flow = PageFlow::new(blocks(&[80, 80, 80])).with_footnotes(vec![Footnote::new(0, 60)]);
    let layout = paginate(&flow, 250);

    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].span.break_index(), 3);
    assert_eq!(layout.pages[0].footnotes, 0..1);
    assert_eq!(layout.pages[0].footnote_area, 60);
    assert!(layout.pages[1].footnotes.is_empty());
    assert_eq!(layout.page_of(4).map(|p| p.index), Some(1));
    assert_tiles(&spans(&layout), 0, flow.elements.len());

    // 30 left over against half the region height as bottom stretch.
    assert!((layout.pages[0].span.adjustment_ratio - 0.24).abs() < 1e-9);
    // The last page never stretches.
    assert_eq!(layout.pages[1].span.adjustment_ratio, 0.0);
    assert!(layout.events.is_empty());
}

#[test]
fn test_later_footnotes_may_be_deferred() {
    let flow = PageFlow::new(blocks(&[100, 100])).with_footnotes(vec![
        Footnote::new(0, 60),
        Footnote::new(0, 100),
    ]);
    let layout = paginate(&flow, 250);

    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].footnotes, 0..1);
    assert_eq!(layout.pages[1].footnotes, 1..2);
    assert!(layout.events.contains(&LayoutEvent::FootnotesDeferred {
        page_index: 0,
        count: 1
    }));
}

#[test]
fn test_without_deferral_footnotes_overflow_their_page() {
    let flow = PageFlow::new(blocks(&[100, 100])).with_footnotes(vec![
        Footnote::new(0, 60),
        Footnote::new(0, 100),
    ]);
    let master = PageMaster::new("body", 400, 250);
    let config = PageBreakingConfig {
        allow_footnote_deferral: false,
        ..PageBreakingConfig::default()
    };
    let layout = PageBreaker::new(config, &master).break_pages(&flow).unwrap();
    assert_eq!(layout.pages[0].footnotes, 0..2);
    assert!(layout.events.iter().any(LayoutEvent::is_overflow));
}

#[test]
fn test_leftover_footnotes_get_their_own_page() {
    let flow = PageFlow::new(blocks(&[200])).with_footnotes(vec![
        Footnote::new(0, 40),
        Footnote::new(0, 100),
    ]);
    let layout = paginate(&flow, 250);

    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].footnotes, 0..1);
    let trailing = &layout.pages[1];
    assert!(trailing.span.is_empty());
    assert_eq!(trailing.span.start, flow.elements.len());
    assert_eq!(trailing.footnotes, 1..2);
    assert_eq!(trailing.footnote_area, 100);
}

#[test]
fn test_long_footnote_continues_on_the_next_page() {
    init_logger();
    let flow = PageFlow::new(blocks(&[150, 150]))
        .with_footnotes(vec![Footnote::with_lines(0, vec![40, 40, 40, 40])]);
    let layout = paginate(&flow, 250);

    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].span.break_index(), 1);
    assert_eq!(layout.pages[0].footnote_lines, 0..2);
    assert_eq!(layout.pages[0].footnote_area, 80);
    assert_eq!(layout.pages[1].footnote_lines, 2..4);
    assert_eq!(layout.pages[1].footnote_area, 80);
    assert_eq!(layout.pages[0].footnotes, 0..1);
    assert_eq!(layout.pages[1].footnotes, 0..1);
    assert!(layout.demerits >= 5000.0, "the cut body is charged");
    assert!(layout.events.is_empty());
}

#[test]
fn test_unsplittable_footnote_overflows_its_page() {
    let flow = PageFlow::new(blocks(&[150, 150]))
        .with_footnotes(vec![Footnote::with_lines(0, vec![40, 40, 40, 40])]);
    let master = PageMaster::new("body", 400, 250);
    let config = PageBreakingConfig {
        allow_footnote_split: false,
        ..PageBreakingConfig::default()
    };
    let layout = PageBreaker::new(config, &master).break_pages(&flow).unwrap();

    assert_eq!(layout.pages[0].footnote_lines, 0..4);
    assert_eq!(layout.pages[0].footnote_area, 160);
    assert!(layout.events.iter().any(LayoutEvent::is_overflow));
}

#[test]
fn test_keeps_and_forced_breaks() {
    // A forbidden break glues the first two blocks together.
    let mut kept = ElementSequence::from(vec![
        Element::boxed(100),
        Element::forbidden_break(),
        Element::boxed(100),
        Element::penalty(0, 0, false),
        Element::boxed(100),
    ]);
    kept.terminate();
    let layout = paginate(&PageFlow::new(kept), 250);
    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].span.break_index(), 3);

    let mut forced = ElementSequence::from(vec![
        Element::boxed(50),
        Element::forced_break(),
        Element::boxed(50),
    ]);
    forced.terminate();
    let layout = paginate(&PageFlow::new(forced), 250);
    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].span.break_index(), 1);
    assert!(layout.pages[0].span.adjustment_ratio <= 1.0);
}

/// Two paragraphs (2 and 3 lines of 100) with stretchable space after each line.
fn two_paragraphs() -> ElementSequence {
    let mut seq = ElementSequence::new();
    let lines = [1u32, 1, 2, 2, 2];
    for (i, producer) in lines.iter().enumerate() {
        if i > 0 {
            seq.append(Element::glue(0, 200, 0));
        }
        seq.append(Element::boxed(100).with_producer(ProducerId(*producer)));
    }
    seq.terminate();
    seq
}

#[test]
fn test_widow_and_orphan_control_moves_the_break() {
    let master = PageMaster::new("body", 400, 400);
    let flow = PageFlow::new(two_paragraphs());

    let strict = PageBreakingConfig {
        orphan_demerits: 50_000.0,
        widow_demerits: 50_000.0,
        ..PageBreakingConfig::default()
    };
    let layout = PageBreaker::new(strict, &master).break_pages(&flow).unwrap();
    assert_eq!(layout.pages[0].span.break_index(), 3, "paragraphs stay whole");

    let lax = PageBreakingConfig {
        orphans: 1,
        widows: 1,
        ..strict
    };
    let layout = PageBreaker::new(lax, &master).break_pages(&flow).unwrap();
    assert_eq!(layout.pages[0].span.break_index(), 7, "the fullest page wins");
}

/// Four rigid lines of one paragraph.
fn rigid_paragraph() -> PageFlow {
    let mut seq = ElementSequence::new();
    for i in 0..4 {
        if i > 0 {
            seq.append(Element::penalty(0, 0, false));
        }
        seq.append(Element::boxed(100).with_producer(ProducerId(0)));
    }
    seq.terminate();
    PageFlow::new(seq)
}

#[test]
fn test_bottom_stretch_lets_a_page_end_short_for_a_widow() {
    let master = PageMaster::new("body", 400, 300);
    let flow = rigid_paragraph();

    let layout = PageBreaker::new(PageBreakingConfig::default(), &master)
        .break_pages(&flow)
        .unwrap();
    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].span.break_index(), 3, "two lines per page");
    assert!(layout.pages[0].span.adjustment_ratio > 0.0);

    let rigid = PageBreakingConfig {
        bottom_stretch: 0.0,
        ..PageBreakingConfig::default()
    };
    let layout = PageBreaker::new(rigid, &master).break_pages(&flow).unwrap();
    assert_eq!(layout.pages[0].span.break_index(), 5, "only a full page is feasible");
}

fn report_master() -> SequenceMasterPolicy {
    let sequence = PageSequenceMaster {
        name: "report".into(),
        sub_sequences: vec![SubSequence::Single {
            master: "cover".into(),
        }],
    };
    SequenceMasterPolicy::new(sequence, vec![PageMaster::new("cover", 400, 250)]).unwrap()
}

#[test]
fn test_running_out_of_masters_is_fatal() {
    let policy = report_master();
    let flow = PageFlow::new(blocks(&[200, 200]));
    let err = PageBreaker::new(PageBreakingConfig::default(), &policy)
        .break_pages(&flow)
        .unwrap_err();
    assert_eq!(
        err,
        LayoutError::PageMasterExhausted {
            sequence: "report".into(),
            page_index: 1
        }
    );
}

/// Every page is 300 tall except the last, which is 150.
fn short_last_page() -> SequenceMasterPolicy {
    let sequence = PageSequenceMaster {
        name: "letter".into(),
        sub_sequences: vec![SubSequence::Alternatives {
            max_repeats: None,
            conditions: vec![
                ConditionalMaster {
                    master: "short".into(),
                    odd_or_even: OddOrEven::Any,
                    page_position: PagePosition::Last,
                    blank_or_not: BlankOrNotBlank::Any,
                },
                ConditionalMaster {
                    master: "tall".into(),
                    odd_or_even: OddOrEven::Any,
                    page_position: PagePosition::Any,
                    blank_or_not: BlankOrNotBlank::Any,
                },
            ],
        }],
    };
    SequenceMasterPolicy::new(
        sequence,
        vec![
            PageMaster::new("tall", 400, 300),
            PageMaster::new("short", 400, 150),
        ],
    )
    .unwrap()
}

#[test]
fn test_smaller_last_master_triggers_a_re_search() {
    init_logger();
    let policy = short_last_page();
    let flow = PageFlow::new(blocks(&[100, 100, 100, 100, 100]));
    let layout = PageBreaker::new(PageBreakingConfig::default(), &policy)
        .break_pages(&flow)
        .unwrap();

    assert_eq!(layout.relayouts, 1);
    assert!(layout.events.contains(&LayoutEvent::Relayout {
        page_index: 1,
        attempt: 1
    }));
    let masters: Vec<&str> = layout.pages.iter().map(|p| p.master.as_str()).collect();
    assert_eq!(masters, vec!["tall", "tall", "short"]);
    assert_tiles(&spans(&layout), 0, flow.elements.len());
    assert!(!layout.events.iter().any(LayoutEvent::is_overflow));
}

#[test]
fn test_re_search_limit_is_fatal() {
    let policy = short_last_page();
    let flow = PageFlow::new(blocks(&[100, 100, 100, 100, 100]));
    let config = PageBreakingConfig {
        max_relayout_retries: 0,
        ..PageBreakingConfig::default()
    };
    let err = PageBreaker::new(config, &policy)
        .break_pages(&flow)
        .unwrap_err();
    assert_eq!(
        err,
        LayoutError::RelayoutLimitExceeded {
            attempts: 0,
            page_index: 1
        }
    );
}

#[test]
fn test_first_page_number_drives_numbering() {
    let master = PageMaster::new("body", 400, 250);
    let flow = PageFlow::new(blocks(&[200, 200]));
    let layout = PageBreaker::new(PageBreakingConfig::default(), &master)
        .with_first_page_number(4)
        .break_pages(&flow)
        .unwrap();
    let numbers: Vec<usize> = layout.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![4, 5]);
}

#[test]
fn test_empty_flow_is_rejected() {
    let master = PageMaster::new("body", 400, 250);
    let err = PageBreaker::new(PageBreakingConfig::default(), &master)
        .break_pages(&PageFlow::default())
        .unwrap_err();
    assert_eq!(err, LayoutError::EmptySequence);
}
