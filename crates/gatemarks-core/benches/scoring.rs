use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gatemarks_core::answer_key::AnswerKey;
use gatemarks_core::engine::{MarkingEngine, Responses};
use gatemarks_core::model::{gate_da, OptionLabel, Submission};
use gatemarks_core::parser::parse_answer_key_text;
use gatemarks_core::statistics::{Distribution, Summary, DEFAULT_BUCKETS};

fn full_key() -> AnswerKey {
    let mut text = String::new();
    for q in 1..=gate_da::QUESTION_COUNT {
        let section = gate_da::section_for(q);
        match q % 3 {
            0 => text.push_str(&format!("{q} MCQ {section} C\n")),
            1 => text.push_str(&format!("{q} MSQ {section} A;D\n")),
            _ => text.push_str(&format!("{q} NAT {section} 1.5 to 1.7\n")),
        }
    }
    parse_answer_key_text(&text).expect("bench key")
}

/// Every question answered; a third right, a third partial or wrong.
fn mixed_responses() -> Responses {
    (1..=gate_da::QUESTION_COUNT)
        .map(|q| {
            let submission = match q % 3 {
                0 if q % 2 == 0 => Submission::Single(OptionLabel::C),
                0 => Submission::Single(OptionLabel::B),
                1 => Submission::Multiple([OptionLabel::A].into()),
                _ => Submission::Numeric(1.6),
            };
            (q, submission)
        })
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");
    let key = full_key();
    let engine = MarkingEngine::new(&key);

    group.bench_function("empty_sheet", |b| {
        let responses = Responses::new();
        b.iter(|| engine.score(black_box(&responses)))
    });

    group.bench_function("mixed_sheet", |b| {
        let responses = mixed_responses();
        b.iter(|| engine.score(black_box(&responses)))
    });

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    let totals: Vec<f64> = (0..10_000).map(|i| (i % 1000) as f64 / 10.0).collect();

    group.bench_function("summary_10k", |b| {
        b.iter(|| Summary::from_values(black_box(&totals)))
    });

    group.bench_function("distribution_10k", |b| {
        b.iter(|| Distribution::from_values(black_box(&totals), DEFAULT_BUCKETS))
    });

    group.finish();
}

criterion_group!(benches, bench_score, bench_statistics);
criterion_main!(benches);
