//! Break search micro-benchmarks
//!
//! Measures the line pass on paragraphs of growing length and the full pipeline
//! on documents with many page sequences.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use folio::layout::{LineBreaker, LineBreakingConfig, LineWidths};
use folio::traits::ElementProducer;
use folio::{DocumentSpec, ExecutorImpl, MonospaceProducer, Pipeline};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::hint::black_box;

const CHAR: i32 = 6000;

fn random_text(words: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..words)
        .map(|_| "x".repeat(rng.random_range(1..10)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn benchmark_line_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_pass");
    let producer = MonospaceProducer::new(CHAR);
    let breaker = LineBreaker::new(LineBreakingConfig::default(), LineWidths::Constant(60 * CHAR));

    for words in [50, 500, 5000] {
        let sequence = producer
            .produce_elements(&random_text(words, 1))
            .expect("Failed to produce elements");
        group.bench_with_input(BenchmarkId::new("words", words), &sequence, |b, seq| {
            b.iter(|| {
                breaker
                    .break_paragraph(black_box(seq))
                    .expect("Failed to break paragraph")
            });
        });
    }

    group.finish();
}

fn document(sequences: usize) -> DocumentSpec {
    let flow: Vec<_> = (0..20)
        .map(|i| json!({ "type": "paragraph", "text": random_text(80, i) }))
        .collect();
    let doc = json!({
        "pageMasters": [{ "name": "body", "regionWidth": 60 * CHAR, "regionHeight": 50 * 12000 }],
        "config": { "charWidth": CHAR },
        "sequences": (0..sequences)
            .map(|i| json!({ "name": format!("s{}", i), "master": "body", "flow": flow }))
            .collect::<Vec<_>>()
    });
    DocumentSpec::from_json(&doc.to_string()).expect("Failed to parse document")
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let doc = document(16);

    for (name, parallel) in [("sequential", false), ("parallel", true)] {
        let pipeline = Pipeline::new().with_executor(ExecutorImpl::for_parallelism(parallel));
        group.bench_function(name, |b| {
            b.iter(|| pipeline.run(black_box(&doc)).expect("Failed to lay out document"));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_line_pass, benchmark_pipeline);
criterion_main!(benches);
