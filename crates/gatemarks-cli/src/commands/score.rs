//! The `gatemarks score` command.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use gatemarks_core::model::Section;
use gatemarks_core::parser::validate_answer_key;
use gatemarks_core::pipeline::{Evaluation, Evaluator, ProgressReporter};
use gatemarks_remote::config::load_config_from;
use gatemarks_remote::{create_source, create_store};
use gatemarks_report::csv::write_csv_report;
use gatemarks_report::html::write_html_report;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_sheet_start(&self, location: &str) {
        eprintln!("  Scoring: {location}");
    }

    fn on_sheet_complete(&self, evaluation: &Evaluation) {
        eprintln!(
            "  Done: {} [{}] {:.2}",
            evaluation.location,
            evaluation.meta.candidate_id,
            evaluation.report.total_marks.as_f64()
        );
    }

    fn on_sheet_error(&self, location: &str, error: &str) {
        eprintln!("  ERROR: {location}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} scored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

const FORMATS: [&str; 5] = ["text", "json", "html", "csv", "markdown"];

pub async fn execute(
    sheets: Vec<String>,
    answer_key: Option<PathBuf>,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    no_rank: bool,
) -> Result<()> {
    let formats: Vec<&str> = if format == "all" {
        FORMATS.to_vec()
    } else {
        format.split(',').map(str::trim).collect()
    };
    for fmt in &formats {
        anyhow::ensure!(
            FORMATS.contains(fmt),
            "unknown format '{fmt}' (expected one of: text, json, html, csv, markdown, all)"
        );
    }

    // Load config
    let config = load_config_from(config_path.as_deref())?;
    let key_path = answer_key.or_else(|| config.answer_key.clone()).context(
        "no answer key: pass --answer-key or set answer_key in gatemarks.toml",
    )?;
    let key = super::load_key(&key_path)?;
    for w in validate_answer_key(&key) {
        let prefix = w.question.map(|q| format!("Q{q}: ")).unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }

    let source = create_source(&config.fetch)?;
    let store = if no_rank {
        None
    } else {
        Some(create_store(&config.store)?)
    };
    let evaluator = Evaluator::new(
        Arc::new(key),
        source,
        store,
        config.evaluator_config(!no_rank),
    )?;

    eprintln!(
        "gatemarks v{} | scoring {} sheet(s) against {}",
        env!("CARGO_PKG_VERSION"),
        sheets.len(),
        evaluator.key().name()
    );
    eprintln!();

    let outcome = evaluator.evaluate_many(&sheets, &ConsoleReporter).await;

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let writes_files = formats.iter().any(|f| *f != "text");
    if writes_files && !outcome.evaluations.is_empty() {
        std::fs::create_dir_all(&output)
            .with_context(|| format!("failed to create {}", output.display()))?;
    }

    let stems = file_stems(
        outcome
            .evaluations
            .iter()
            .map(|e| e.meta.candidate_id.as_str()),
    );
    for (evaluation, stem) in outcome.evaluations.iter().zip(&stems) {
        print_summary(evaluation);
        for fmt in &formats {
            write_output(evaluation, fmt, &output, stem)?;
        }
    }

    anyhow::ensure!(
        outcome.failures.is_empty(),
        "{} of {} sheet(s) could not be scored",
        outcome.failures.len(),
        sheets.len()
    );

    Ok(())
}

fn write_output(evaluation: &Evaluation, fmt: &str, output: &Path, stem: &str) -> Result<()> {
    match fmt {
        "json" => {
            let path = output.join(format!("{stem}.json"));
            evaluation.report.save_json(&path)?;
            eprintln!("Results saved to: {}", path.display());
        }
        "html" => {
            let path = output.join(format!("{stem}.html"));
            write_html_report(evaluation, &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        "csv" => {
            let path = output.join(format!("{stem}.csv"));
            write_csv_report(&evaluation.report, &path)?;
            eprintln!("CSV report: {}", path.display());
        }
        "markdown" => {
            let path = output.join(format!("{stem}.md"));
            std::fs::write(&path, evaluation.report.to_markdown())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Markdown summary: {}", path.display());
        }
        _ => {}
    }
    Ok(())
}

/// Output file names: the sanitized candidate id, else the sheet's position.
/// Repeats get a `-2`, `-3`, ... suffix so no report overwrites another.
fn file_stems<'a>(candidate_ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    candidate_ids
        .enumerate()
        .map(|(idx, id)| {
            let id: String = id
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
                .collect();
            let base = if id.is_empty() {
                format!("sheet-{}", idx + 1)
            } else {
                id
            };
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base}-{count}")
            }
        })
        .collect()
}

fn print_summary(evaluation: &Evaluation) {
    use comfy_table::{Cell, Table};

    let report = &evaluation.report;
    let meta = &evaluation.meta;

    if !meta.candidate_id.is_empty() {
        println!("\nCandidate: {} ({})", meta.candidate_name, meta.candidate_id);
    }

    let mut table = Table::new();
    table.set_header(vec!["Section", "Marks", "Max"]);
    for section in Section::ALL {
        table.add_row(vec![
            Cell::new(section),
            Cell::new(format!("{:.2}", report.section_marks(section).as_f64())),
            Cell::new(format!("{:.2}", report.section_max_marks(section).as_f64())),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(format!("{:.2}", report.total_marks.as_f64())),
        Cell::new(format!("{:.2}", report.max_marks.as_f64())),
    ]);
    println!("{table}");

    println!(
        "Correct {} | partial {} | wrong {} | unanswered {} | accuracy {:.1}%",
        report.correct_count,
        report.partial_count,
        report.incorrect_count,
        report.unanswered_count,
        report.accuracy * 100.0
    );
    match (evaluation.rank, &evaluation.rank_table) {
        (Some(rank), Some(ranks)) => println!("Rank: {rank} of {}", ranks.len()),
        (Some(rank), None) => println!("Rank: {rank}"),
        _ => {}
    }

    for d in &report.diagnostics {
        eprintln!("Warning: Q{}: {}", d.question_number, d.message);
    }
    for w in &evaluation.sheet_warnings {
        let prefix = w.question.map(|q| format!("Q{q}: ")).unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }
}
