use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gatemarks_core::model::gate_da;
use gatemarks_core::parser::parse_answer_key_text;
use gatemarks_core::sheet::SheetParser;

fn question_panel(q: u32) -> String {
    let stem = if q <= 10 {
        format!("G1_ga1q{q}")
    } else {
        format!("G1_daq{q}")
    };
    let (qtype, label, answer) = match q % 3 {
        0 => ("NAT", "Given Answer", "1.6".to_string()),
        1 => ("MSQ", "Chosen Option", "A,C".to_string()),
        _ => ("MCQ", "Chosen Option", "B".to_string()),
    };
    let mut html = format!(
        r#"<div class="question-pnl"><table><tr><td><img name="{stem}q.png"></td></tr>"#
    );
    for (shown, original) in [("A", "d"), ("B", "a"), ("C", "b"), ("D", "c")] {
        html.push_str(&format!(
            r#"<tr><td>{shown}. <img name="{stem}{original}.png"></td></tr>"#
        ));
    }
    html.push_str(&format!(
        r#"</table><table><tr><td>Question Type :</td><td>{qtype}</td></tr><tr><td>{label} :</td><td>{answer}</td></tr></table></div>"#
    ));
    html
}

fn bench_sheet(c: &mut Criterion) {
    let mut group = c.benchmark_group("sheet");
    let parser = SheetParser::new().expect("sheet patterns");

    let mut full = String::from(
        r#"<table><tr><td>Candidate ID</td><td>DA26S001</td></tr></table>"#,
    );
    for q in 1..=gate_da::QUESTION_COUNT {
        full.push_str(&question_panel(q));
    }
    let single = question_panel(42);

    group.bench_function("single_panel", |b| {
        b.iter(|| parser.parse(black_box(&single)))
    });

    group.bench_function("full_sheet", |b| {
        b.iter(|| parser.parse(black_box(&full)))
    });

    group.finish();
}

fn bench_key_text(c: &mut Criterion) {
    let mut text = String::from("Q.No. Type Section Key\n");
    for q in 1..=gate_da::QUESTION_COUNT {
        text.push_str(&format!(
            "{q} NAT {} {}.0 to {}.5\n",
            gate_da::section_for(q),
            q,
            q
        ));
    }

    c.bench_function("answer_key_text", |b| {
        b.iter(|| parse_answer_key_text(black_box(&text)))
    });
}

criterion_group!(benches, bench_sheet, bench_key_text);
criterion_main!(benches);
