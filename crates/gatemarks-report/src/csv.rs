//! CSV export of the question-wise breakdown.

use std::path::Path;

use anyhow::{Context, Result};

use gatemarks_core::report::Report;

const HEADER: [&str; 8] = [
    "Q#",
    "Section",
    "Type",
    "Max",
    "Your Answer",
    "Key",
    "Earned",
    "Status",
];

/// Quote a field when it contains a separator, quote, or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row(out: &mut String, fields: &[String]) {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Generate the CSV text for a report, one row per question.
pub fn generate_csv(report: &Report) -> String {
    let mut out = String::new();
    push_row(&mut out, &HEADER.map(String::from));

    for q in &report.per_question {
        push_row(
            &mut out,
            &[
                q.question_number.to_string(),
                q.section.to_string(),
                q.question_type.to_string(),
                q.max_marks.as_f64().to_string(),
                q.submitted
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "--".to_string()),
                q.key.to_string(),
                format!("{:+.2}", q.marks_awarded.as_f64()),
                q.status.to_string(),
            ],
        );
    }

    out
}

/// Write a CSV report to a file.
pub fn write_csv_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_csv(report))
        .with_context(|| format!("failed to write CSV to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gatemarks_core::answer_key::{AnswerKey, AnswerKeyEntry};
    use gatemarks_core::engine::{MarkingEngine, Responses};
    use gatemarks_core::model::{CorrectAnswer, OptionLabel, Section, Submission};

    pub(crate) fn sample_report() -> Report {
        let entry = |n: u32, answer: CorrectAnswer, marks: u8| AnswerKeyEntry {
            question_number: n,
            answer,
            marks,
            section: if n == 1 { Section::GA } else { Section::DA },
        };
        let key = AnswerKey::new(
            "Mock DA",
            vec![
                entry(1, CorrectAnswer::Single { option: OptionLabel::B }, 1),
                entry(
                    2,
                    CorrectAnswer::Multiple {
                        options: [OptionLabel::A, OptionLabel::C].into(),
                    },
                    2,
                ),
                entry(3, CorrectAnswer::Numerical { min: 4.9, max: 5.1 }, 2),
            ],
        )
        .unwrap();
        let responses = Responses::from([
            (1, Submission::Single(OptionLabel::C)),
            (2, Submission::Multiple([OptionLabel::A].into())),
        ]);
        MarkingEngine::new(&key).score(&responses)
    }

    #[test]
    fn csv_rows_per_question() {
        let csv = generate_csv(&sample_report());
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Q#,Section,Type,Max,Your Answer,Key,Earned,Status");
        assert_eq!(lines[1], "1,GA,MCQ,1,C,B,-0.33,INCORRECT");
        assert_eq!(lines[2], "2,DA,MSQ,2,A,\"A,C\",+1.00,PARTIAL");
        assert_eq!(lines[3], "3,DA,NAT,2,--,4.9 to 5.1,+0.00,UNANSWERED");
    }

    #[test]
    fn escapes_quotes_and_commas() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.csv");
        write_csv_report(&sample_report(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Q#,Section"));
    }
}
