//! Answer key loaders.
//!
//! Keys come either from a hand-written TOML file or from the plain-text
//! rendering of the official answer-key PDF (one question per line).

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::answer_key::{AnswerKey, AnswerKeyEntry};
use crate::model::{gate_da, parse_label_set, CorrectAnswer, OptionLabel, QuestionType, Section};

/// Intermediate TOML structure for answer key files.
#[derive(Debug, Deserialize)]
struct TomlKeyFile {
    #[serde(default)]
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    #[serde(default = "default_exam_name")]
    name: String,
}

impl Default for TomlExamHeader {
    fn default() -> Self {
        Self {
            name: default_exam_name(),
        }
    }
}

fn default_exam_name() -> String {
    "GATE DA".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    number: u32,
    #[serde(rename = "type")]
    question_type: String,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    marks: Option<u8>,
    answer: TomlAnswer,
}

/// Accepts `"B"`, `"A;C"`, `["A", "C"]`, `5.0`, `"4.9 to 5.1"` or `{ min, max }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlAnswer {
    Number(f64),
    Range { min: f64, max: f64 },
    List(Vec<String>),
    Text(String),
}

/// Parse an answer key file, choosing the format by extension.
///
/// `.toml` files are read as TOML; anything else as the text rendering.
pub fn parse_answer_key(path: &Path) -> Result<AnswerKey> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer key: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "toml") {
        parse_answer_key_str(&content, path)
    } else {
        parse_answer_key_text(&content)
            .with_context(|| format!("failed to parse answer key text: {}", path.display()))
    }
}

/// Parse a TOML string into an `AnswerKey` (useful for testing).
pub fn parse_answer_key_str(content: &str, source_path: &Path) -> Result<AnswerKey> {
    let parsed: TomlKeyFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let entries = parsed
        .questions
        .into_iter()
        .map(|q| {
            let question_type: QuestionType =
                q.question_type.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
            let section = match q.section {
                Some(s) => s.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?,
                None => gate_da::section_for(q.number),
            };
            let answer = toml_answer(question_type, q.answer)
                .with_context(|| format!("question {}", q.number))?;

            Ok(AnswerKeyEntry {
                question_number: q.number,
                answer,
                marks: q.marks.unwrap_or_else(|| gate_da::marks_for(q.number)),
                section,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    AnswerKey::new(parsed.exam.name, entries)
        .with_context(|| format!("invalid answer key: {}", source_path.display()))
}

fn toml_answer(question_type: QuestionType, answer: TomlAnswer) -> Result<CorrectAnswer> {
    let answer = match (question_type, answer) {
        (QuestionType::SingleCorrect, TomlAnswer::Text(s)) => CorrectAnswer::Single {
            option: s.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?,
        },
        (QuestionType::MultiCorrect, TomlAnswer::Text(s)) => CorrectAnswer::Multiple {
            options: parse_label_set(&s).map_err(|e| anyhow::anyhow!("{}", e))?,
        },
        (QuestionType::MultiCorrect, TomlAnswer::List(items)) => CorrectAnswer::Multiple {
            options: items
                .iter()
                .map(|s| s.parse::<OptionLabel>())
                .collect::<Result<_, _>>()
                .map_err(|e| anyhow::anyhow!("{}", e))?,
        },
        (QuestionType::Numerical, TomlAnswer::Number(v)) => CorrectAnswer::numerical_exact(v),
        (QuestionType::Numerical, TomlAnswer::Range { min, max }) => {
            CorrectAnswer::Numerical { min, max }
        }
        (QuestionType::Numerical, TomlAnswer::Text(s)) => parse_numeric_key(&s)?,
        (qt, other) => anyhow::bail!("answer {other:?} does not fit a {qt} question"),
    };
    Ok(answer)
}

/// Parse a NAT key written as `"a to b"` (spacing optional) or a single value.
fn parse_numeric_key(s: &str) -> Result<CorrectAnswer> {
    let range_re = Regex::new(r"(?i)^\s*([+-]?\d*\.?\d+)\s*to\s*([+-]?\d*\.?\d+)\s*$")?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .with_context(|| format!("invalid numeric key: {s}"))
    };
    match range_re.captures(s) {
        Some(caps) => Ok(CorrectAnswer::Numerical {
            min: parse(&caps[1])?,
            max: parse(&caps[2])?,
        }),
        None => Ok(CorrectAnswer::numerical_exact(parse(s)?)),
    }
}

/// Parse the text rendering of the official answer key.
///
/// Each question is one line `<n> <MCQ|MSQ|NAT> <GA|DA> <key>`; other lines
/// (headers, page furniture) are ignored. The full paper must be present.
pub fn parse_answer_key_text(text: &str) -> Result<AnswerKey> {
    let line_re = Regex::new(r"(?i)^\s*(\d+)\s+(MCQ|MSQ|NAT)\s+(GA|DA)\s+(.+?)\s*$")?;

    let mut entries = Vec::new();
    for line in text.lines() {
        let Some(caps) = line_re.captures(line) else {
            continue;
        };
        let number: u32 = caps[1].parse()?;
        let question_type: QuestionType =
            caps[2].parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
        let section: Section = caps[3].parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
        let key = &caps[4];

        let answer = match question_type {
            QuestionType::SingleCorrect => CorrectAnswer::Single {
                option: key.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?,
            },
            QuestionType::MultiCorrect => CorrectAnswer::Multiple {
                options: parse_label_set(key).map_err(|e| anyhow::anyhow!("{}", e))?,
            },
            QuestionType::Numerical => parse_numeric_key(key)?,
        };

        entries.push(AnswerKeyEntry {
            question_number: number,
            answer,
            marks: gate_da::marks_for(number),
            section,
        });
    }

    if entries.len() != gate_da::QUESTION_COUNT as usize {
        anyhow::bail!(
            "expected {} questions in answer key text, found {}",
            gate_da::QUESTION_COUNT,
            entries.len()
        );
    }

    Ok(AnswerKey::new(default_exam_name(), entries)?)
}

/// A warning from answer key validation.
#[derive(Debug, Clone)]
pub struct KeyWarning {
    /// The question number (if applicable).
    pub question: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Compare a key against the GATE DA paper layout.
///
/// A key for another paper is still usable; these are warnings only.
pub fn validate_answer_key(key: &AnswerKey) -> Vec<KeyWarning> {
    let mut warnings = Vec::new();

    if key.len() != gate_da::QUESTION_COUNT {
        warnings.push(KeyWarning {
            question: None,
            message: format!(
                "key has {} questions, the GATE DA paper has {}",
                key.len(),
                gate_da::QUESTION_COUNT
            ),
        });
    }

    for entry in key.entries() {
        let q = entry.question_number;
        if q > gate_da::QUESTION_COUNT {
            continue;
        }
        if entry.marks != gate_da::marks_for(q) {
            warnings.push(KeyWarning {
                question: Some(q),
                message: format!(
                    "worth {} marks, layout says {}",
                    entry.marks,
                    gate_da::marks_for(q)
                ),
            });
        }
        if entry.section != gate_da::section_for(q) {
            warnings.push(KeyWarning {
                question: Some(q),
                message: format!(
                    "in section {}, layout says {}",
                    entry.section,
                    gate_da::section_for(q)
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exam]
name = "Mock DA"

[[questions]]
number = 1
type = "MCQ"
answer = "b"

[[questions]]
number = 2
type = "MSQ"
section = "DA"
answer = ["A", "C"]

[[questions]]
number = 3
type = "NAT"
answer = "4.9 to 5.1"

[[questions]]
number = 4
type = "NAT"
marks = 2
answer = 7

[[questions]]
number = 5
type = "NAT"
answer = { min = -1.5, max = -1.0 }
"#;

    #[test]
    fn parse_valid_toml() {
        let key = parse_answer_key_str(VALID_TOML, &PathBuf::from("key.toml")).unwrap();
        assert_eq!(key.name(), "Mock DA");
        assert_eq!(key.len(), 5);

        let q1 = key.get(1).unwrap();
        assert_eq!(q1.answer, CorrectAnswer::Single { option: OptionLabel::B });
        assert_eq!(q1.marks, 1);
        assert_eq!(q1.section, Section::GA);

        assert_eq!(
            key.get(2).unwrap().answer,
            CorrectAnswer::Multiple {
                options: [OptionLabel::A, OptionLabel::C].into()
            }
        );
        assert_eq!(
            key.get(3).unwrap().answer,
            CorrectAnswer::Numerical { min: 4.9, max: 5.1 }
        );
        match key.get(4).unwrap().answer {
            CorrectAnswer::Numerical { min, max } => {
                assert!((min - 6.99).abs() < 1e-9);
                assert!((max - 7.01).abs() < 1e-9);
            }
            ref other => panic!("unexpected answer {other:?}"),
        }
        assert_eq!(key.get(4).unwrap().marks, 2);
    }

    #[test]
    fn toml_answer_must_fit_type() {
        let toml = r#"
[[questions]]
number = 1
type = "MCQ"
answer = 3.5
"#;
        let err = parse_answer_key_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("does not fit"));
    }

    #[test]
    fn toml_gap_in_numbers_is_rejected() {
        let toml = r#"
[[questions]]
number = 1
type = "MCQ"
answer = "A"

[[questions]]
number = 3
type = "MCQ"
answer = "B"
"#;
        let err = parse_answer_key_str(toml, &PathBuf::from("gap.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("question 2"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_answer_key_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    pub(crate) fn full_key_text() -> String {
        let mut text = String::from("GATE 2026 Data Science and AI\nQ.No. Type Section Key\n");
        for q in 1..=gate_da::QUESTION_COUNT {
            let section = gate_da::section_for(q);
            let line = match q % 3 {
                0 => format!("{q} MCQ {section} C\n"),
                1 => format!("{q} MSQ {section} A;D\n"),
                _ => format!("{q} NAT {section} 1.5 To 1.7\n"),
            };
            text.push_str(&line);
        }
        text
    }

    #[test]
    fn parse_text_key() {
        let key = parse_answer_key_text(&full_key_text()).unwrap();
        assert_eq!(key.len(), 65);
        assert_eq!(key.max_marks().as_f64(), 100.0);
        assert_eq!(key.section_max_marks(Section::GA).as_f64(), 15.0);
        assert_eq!(
            key.get(2).unwrap().answer,
            CorrectAnswer::Numerical { min: 1.5, max: 1.7 }
        );
        assert!(validate_answer_key(&key).is_empty());
    }

    #[test]
    fn text_key_must_be_complete() {
        let err = parse_answer_key_text("1 MCQ GA A\n2 MCQ GA B\n").unwrap_err();
        assert!(err.to_string().contains("expected 65"));
    }

    #[test]
    fn validate_flags_layout_mismatches() {
        let key = parse_answer_key_str(VALID_TOML, &PathBuf::from("key.toml")).unwrap();
        let warnings = validate_answer_key(&key);
        assert!(warnings.iter().any(|w| w.question.is_none()));
        assert!(warnings
            .iter()
            .any(|w| w.question == Some(2) && w.message.contains("section")));
        assert!(warnings
            .iter()
            .any(|w| w.question == Some(4) && w.message.contains("marks")));
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("key.toml");
        std::fs::write(&toml_path, VALID_TOML).unwrap();
        assert_eq!(parse_answer_key(&toml_path).unwrap().len(), 5);

        let txt_path = dir.path().join("key.txt");
        std::fs::write(&txt_path, full_key_text()).unwrap();
        assert_eq!(parse_answer_key(&txt_path).unwrap().len(), 65);
    }

    #[test]
    fn numeric_keys_accept_loose_range_spacing() {
        let expected = CorrectAnswer::Numerical { min: 4.9, max: 5.1 };
        for text in ["4.9 to 5.1", "4.9to5.1", "4.9   TO  5.1", " 4.9 to5.1 "] {
            assert_eq!(parse_numeric_key(text).unwrap(), expected, "{text:?}");
        }
        assert_eq!(
            parse_numeric_key("-0.5 to .5").unwrap(),
            CorrectAnswer::Numerical { min: -0.5, max: 0.5 }
        );
        assert_eq!(
            parse_numeric_key(" 2.3 ").unwrap(),
            CorrectAnswer::numerical_exact(2.3)
        );
        assert!(parse_numeric_key("4.9 till 5.1").is_err());
    }
}
