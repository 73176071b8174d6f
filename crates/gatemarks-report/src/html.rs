//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use gatemarks_core::model::Section;
use gatemarks_core::pipeline::Evaluation;
use gatemarks_core::rank::RankTable;
use gatemarks_core::results::Status;
use gatemarks_core::statistics::{Distribution, Summary};

/// Rows of the rank table shown on the page.
const RANK_ROWS: usize = 50;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn status_class(status: Status) -> &'static str {
    match status {
        Status::Correct => "correct",
        Status::Incorrect => "wrong",
        Status::Partial => "partial",
        Status::Unanswered => "unanswered",
    }
}

/// Generate an HTML report for one evaluated sheet.
pub fn generate_html(evaluation: &Evaluation) -> String {
    let report = &evaluation.report;
    let meta = &evaluation.meta;
    let mut html = String::new();

    let who = if meta.candidate_name.is_empty() {
        report.exam.as_str()
    } else {
        meta.candidate_name.as_str()
    };

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>gatemarks report | {}</title>\n",
        html_escape(who)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{} marks report</h1>\n", html_escape(&report.exam)));
    html.push_str("<table class=\"meta-table\">\n");
    for (label, value) in [
        ("Candidate ID", &meta.candidate_id),
        ("Candidate Name", &meta.candidate_name),
        ("Test Date", &meta.test_date),
        ("Subject", &meta.subject),
    ] {
        if !value.is_empty() {
            html.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>\n",
                label,
                html_escape(value)
            ));
        }
    }
    html.push_str("</table>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Source: {} | evaluated {}</p>\n",
        html_escape(&evaluation.location),
        evaluation.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Score cards
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Score</h2>\n<div class=\"cards\">\n");
    html.push_str(&card(
        "Total",
        &format!(
            "{:.2} / {:.2}",
            report.total_marks.as_f64(),
            report.max_marks.as_f64()
        ),
    ));
    for section in Section::ALL {
        html.push_str(&card(
            &section.to_string(),
            &format!(
                "{:.2} / {:.2}",
                report.section_marks(section).as_f64(),
                report.section_max_marks(section).as_f64()
            ),
        ));
    }
    let rank_text = match (evaluation.rank, &evaluation.rank_table) {
        (Some(rank), Some(table)) => format!("#{rank} of {}", table.len()),
        (Some(rank), None) => format!("#{rank}"),
        _ => "-".to_string(),
    };
    html.push_str(&card("Rank", &rank_text));
    html.push_str(&card(
        "Accuracy",
        &format!("{:.1}%", report.accuracy * 100.0),
    ));
    html.push_str("</div>\n");
    html.push_str(&format!(
        "<p class=\"counts\">Attempted {} | correct {} | partial {} | wrong {} | unanswered {}</p>\n",
        report.attempted_count,
        report.correct_count,
        report.partial_count,
        report.incorrect_count,
        report.unanswered_count
    ));

    if !report.diagnostics.is_empty() || !evaluation.sheet_warnings.is_empty() {
        html.push_str("<ul class=\"warnings\">\n");
        for d in &report.diagnostics {
            html.push_str(&format!(
                "<li>Q{}: {}</li>\n",
                d.question_number,
                html_escape(&d.message)
            ));
        }
        for w in &evaluation.sheet_warnings {
            let prefix = w.question.map(|q| format!("Q{q}: ")).unwrap_or_default();
            html.push_str(&format!("<li>{}{}</li>\n", prefix, html_escape(&w.message)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    // Question-wise table
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Question-wise Report</h2>\n<div class=\"tools\">");
    for (label, call) in [
        ("All", "filterRows('ALL')"),
        ("GA", "filterRows('GA')"),
        ("DA", "filterRows('DA')"),
        ("Correct", "statusRows('CORRECT')"),
        ("Partial", "statusRows('PARTIAL')"),
        ("Wrong", "statusRows('INCORRECT')"),
        ("Unanswered", "statusRows('UNANSWERED')"),
    ] {
        html.push_str(&format!(
            "<button class=\"pill\" onclick=\"{call}\">{label}</button>"
        ));
    }
    html.push_str("</div>\n");
    html.push_str("<table class=\"results-table\" id=\"report-table\">\n");
    html.push_str("<thead><tr><th>Q#</th><th>Section</th><th>Type</th><th>Max</th><th>Your Answer</th><th>Key</th><th>Earned</th><th>Status</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for q in &report.per_question {
        let submitted = q
            .submitted
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "--".to_string());
        html.push_str(&format!(
            "<tr class=\"{} {}\" data-section=\"{}\" data-status=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:+.2}</td><td>{}</td></tr>\n",
            q.section.to_string().to_lowercase(),
            status_class(q.status),
            q.section,
            q.status,
            q.question_number,
            q.section,
            q.question_type,
            q.max_marks.as_f64(),
            html_escape(&submitted),
            html_escape(&q.key.to_string()),
            q.marks_awarded.as_f64(),
            q.status
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Rank table and insights
    if let Some(table) = &evaluation.rank_table {
        html.push_str(&generate_rank_section(table, &meta.candidate_id));
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(evaluation: &Evaluation, path: &Path) -> Result<()> {
    let html = generate_html(evaluation);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn card(label: &str, value: &str) -> String {
    format!(
        "<div class=\"card\"><span class=\"card-k\">{}</span><span class=\"card-v\">{}</span></div>\n",
        html_escape(label),
        html_escape(value)
    )
}

fn generate_rank_section(table: &RankTable, candidate_id: &str) -> String {
    let mut html = String::new();
    html.push_str("<section class=\"ranks\">\n<h2>Rank Table</h2>\n");

    if table.is_empty() {
        html.push_str("<p class=\"meta\">No submissions recorded yet.</p>\n</section>\n");
        return html;
    }

    html.push_str("<table class=\"rank-table\">\n");
    // Other candidates' ids stay out of the page; only the reader's row is marked.
    html.push_str("<thead><tr><th>Rank</th><th>Marks</th></tr></thead>\n<tbody>\n");
    for (idx, entry) in table.entries().iter().take(RANK_ROWS).enumerate() {
        let class = if entry.candidate_id == candidate_id.trim() {
            " class=\"me\""
        } else {
            ""
        };
        html.push_str(&format!(
            "<tr{}><td>{}</td><td>{:.2}</td></tr>\n",
            class,
            idx + 1,
            entry.marks
        ));
    }
    html.push_str("</tbody></table>\n");

    if let (Some(summary), Some(dist)) = (table.summary(), table.distribution()) {
        html.push_str("<h2>Score Insights</h2>\n<div class=\"cards\">\n");
        for (label, value) in [
            ("Samples", summary.samples.to_string()),
            ("Mean", format!("{:.2}", summary.mean)),
            ("SD", format!("{:.2}", summary.std_dev)),
            ("Median", format!("{:.2}", summary.median)),
            ("Min", format!("{:.2}", summary.min)),
            ("Max", format!("{:.2}", summary.max)),
            ("P90", format!("{:.2}", summary.p90)),
        ] {
            html.push_str(&card(label, &value));
        }
        html.push_str("</div>\n");
        html.push_str(&generate_histogram(&dist, &summary));
    }

    html.push_str("</section>\n");
    html
}

/// SVG histogram of stored totals with mean, median, and P90 markers.
fn generate_histogram(dist: &Distribution, summary: &Summary) -> String {
    let chart_height = 200.0;
    let slot_width = 40.0;
    let pad_left = 40.0;
    let pad_bottom = 30.0;
    let pad_top = 20.0;

    let buckets = dist.counts.len();
    let plot_width = slot_width * buckets as f64;
    let width = pad_left + plot_width + 20.0;
    let height = pad_top + chart_height + pad_bottom;
    let tallest = dist.tallest().max(1) as f64;
    let baseline = pad_top + chart_height;

    let mut svg = format!(
        "<svg class=\"histogram\" width=\"{width:.0}\" height=\"{height:.0}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
    );
    svg.push_str(&format!(
        "  <line x1=\"{pad_left}\" y1=\"{baseline}\" x2=\"{:.1}\" y2=\"{baseline}\" stroke=\"currentColor\"/>\n",
        pad_left + plot_width
    ));

    for (i, &count) in dist.counts.iter().enumerate() {
        let bar_height = count as f64 / tallest * chart_height;
        let x = pad_left + i as f64 * slot_width + slot_width * 0.14;
        let (lo, hi) = dist.bucket_bounds(i);
        svg.push_str(&format!(
            "  <rect x=\"{x:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{bar_height:.1}\" fill=\"#14b8a6\" rx=\"3\"><title>{lo:.1} to {hi:.1}: {count}</title></rect>\n",
            baseline - bar_height,
            slot_width * 0.72
        ));
    }

    let span = (dist.max - dist.min).max(f64::EPSILON);
    let x_of = |v: f64| pad_left + (v - dist.min) / span * plot_width;
    for (label, value, color) in [
        ("P50", summary.median, "#f59e0b"),
        ("Mean", summary.mean, "#2563eb"),
        ("P90", summary.p90, "#ef4444"),
    ] {
        let x = x_of(value);
        svg.push_str(&format!(
            "  <line x1=\"{x:.1}\" y1=\"{pad_top}\" x2=\"{x:.1}\" y2=\"{baseline}\" stroke=\"{color}\" stroke-dasharray=\"5,4\"/>\n"
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"{color}\">{label}</text>\n",
            x + 4.0,
            pad_top - 6.0
        ));
    }

    svg.push_str(&format!(
        "  <text x=\"{pad_left}\" y=\"{:.1}\" font-size=\"11\" fill=\"currentColor\">{:.1}</text>\n",
        baseline + 18.0,
        dist.min
    ));
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"currentColor\" text-anchor=\"end\">{:.1}</text>\n",
        pad_left + plot_width,
        baseline + 18.0,
        dist.max
    ));

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --correct: #dcfce7; --wrong: #fde2e2; --partial: #fef9c3; --me: #dbeafe; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --correct: #064e3b; --wrong: #7f1d1d; --partial: #713f12; --me: #1e3a8a; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .counts { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
.meta-table { width: auto; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.cards { display: flex; flex-wrap: wrap; gap: 1rem; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 0.75rem 1rem; min-width: 7rem; }
.card-k { display: block; font-size: 0.8rem; color: #6b7280; }
.card-v { display: block; font-size: 1.3rem; font-weight: bold; }
.pill { border: 1px solid var(--border); border-radius: 999px; background: none; color: inherit; padding: 0.25rem 0.75rem; margin-right: 0.25rem; cursor: pointer; }
.correct { background: var(--correct); }
.wrong { background: var(--wrong); }
.partial { background: var(--partial); }
.rank-table .me { background: var(--me); font-weight: bold; }
.warnings { color: #b45309; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function rows() {
  return document.querySelectorAll('#report-table tbody tr');
}
function filterRows(section) {
  rows().forEach(tr => tr.style.display = (section === 'ALL' || tr.dataset.section === section) ? '' : 'none');
}
function statusRows(status) {
  rows().forEach(tr => tr.style.display = tr.dataset.status === status ? '' : 'none');
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use gatemarks_core::rank::RankEntry;
    use gatemarks_core::sheet::CandidateMeta;

    fn make_evaluation(rank_table: Option<RankTable>) -> Evaluation {
        Evaluation {
            location: "https://portal.example/sheet?id=<1>".into(),
            evaluated_at: chrono::Utc::now(),
            meta: CandidateMeta {
                candidate_id: "DA26S001".into(),
                candidate_name: "Asha Rao".into(),
                test_date: "15/02/2026".into(),
                subject: "Data Science and Artificial Intelligence".into(),
            },
            report: crate::csv::tests::sample_report(),
            rank: rank_table.as_ref().and_then(|t| t.position_of("DA26S001")),
            rank_table,
            sheet_warnings: vec![],
        }
    }

    fn table() -> RankTable {
        RankTable::from_entries(
            [("DA26S001", 0.67), ("DA26S002", 40.0), ("DA26S003", 72.5)].map(
                |(id, marks)| RankEntry {
                    candidate_id: id.into(),
                    marks,
                },
            ),
        )
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_evaluation(Some(table())));

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Asha Rao"));
        assert!(html.contains("Mock DA marks report"));
        assert!(html.contains("#3 of 3"));
        assert!(html.contains("data-section=\"GA\" data-status=\"INCORRECT\""));
        assert!(html.contains("<tr class=\"me\"><td>3</td><td>0.67</td></tr>"));
        assert!(html.contains("<tr><td>1</td><td>72.50</td></tr>"));
        assert!(!html.contains("DA26S002"));
        assert!(!html.contains("DA26S003"));
        assert!(html.contains("<svg class=\"histogram\""));
        assert!(html.contains("Median"));
    }

    #[test]
    fn escapes_untrusted_text() {
        let html = generate_html(&make_evaluation(None));
        assert!(html.contains("id=&lt;1&gt;"));
        assert!(!html.contains("id=<1>"));
        assert!(!html.contains("Rank Table"));
    }

    #[test]
    fn histogram_has_one_bar_per_bucket() {
        let table = table();
        let svg = generate_histogram(
            &table.distribution().unwrap(),
            &table.summary().unwrap(),
        );
        assert_eq!(svg.matches("<rect").count(), dist_buckets(&table));
        assert!(svg.contains(">P90<"));
    }

    fn dist_buckets(table: &RankTable) -> usize {
        table.distribution().map(|d| d.counts.len()).unwrap_or(0)
    }

    #[test]
    fn html_report_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&make_evaluation(None), &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
