//! Response-sheet parser.
//!
//! Reads the candidate response page exported by the exam portal and
//! normalizes it into [`Responses`]. The portal shuffles options per
//! candidate, so displayed labels are mapped back to the paper's original
//! labels through the option image names.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::Responses;
use crate::error::SheetError;
use crate::model::{OptionLabel, QuestionType, Submission};

/// Candidate details printed at the top of the response sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMeta {
    pub candidate_id: String,
    pub candidate_name: String,
    pub test_date: String,
    pub subject: String,
}

/// Something in the sheet that was skipped rather than scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetWarning {
    pub question: Option<u32>,
    pub message: String,
}

/// Result of parsing one response sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub meta: CandidateMeta,
    /// Answered questions only.
    pub responses: Responses,
    /// Question panels recognized, answered or not.
    pub questions_seen: usize,
    pub warnings: Vec<SheetWarning>,
}

/// Compiled patterns for the portal's response-sheet markup.
#[derive(Debug, Clone)]
pub struct SheetParser {
    panel_start: Regex,
    first_image: Regex,
    da_question: Regex,
    ga_question: Regex,
    option_image: Regex,
    question_type: Regex,
    chosen_option: Regex,
    given_answer: Regex,
    candidate_id: Regex,
    candidate_name: Regex,
    test_date: Regex,
    subject: Regex,
}

fn field_pattern(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i){}\s*:</td>\s*<td[^>]*>\s*([^<]+?)\s*</td>",
        regex::escape(label)
    ))
}

fn meta_pattern(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i){}\s*</td>\s*<td[^>]*>\s*([^<]+?)\s*</td>",
        regex::escape(label)
    ))
}

impl SheetParser {
    pub fn new() -> Result<Self, SheetError> {
        Ok(Self {
            panel_start: Regex::new(r#"(?i)<div class="question-pnl"[^>]*>"#)?,
            first_image: Regex::new(r#"(?i)<img[^>]*name="([^"]+)"[^>]*>"#)?,
            da_question: Regex::new(r"(?i)daq(\d+)q(?:v\d+)?\.png$")?,
            ga_question: Regex::new(r"(?i)ga\d*q(\d+)q(?:v\d+)?\.png$")?,
            option_image: Regex::new(
                r#"(?i)([ABCD])\.\s*<img[^>]*name="[^"]*_(?:ga\d*q\d+|daq\d+)([abcd])(?:v\d+)?\.png""#,
            )?,
            question_type: Regex::new(
                r"(?i)Question Type\s*:</td>\s*<td[^>]*>\s*(MCQ|MSQ|NAT)\s*</td>",
            )?,
            chosen_option: field_pattern("Chosen Option")?,
            given_answer: field_pattern("Given Answer")?,
            candidate_id: meta_pattern("Candidate ID")?,
            candidate_name: meta_pattern("Candidate Name")?,
            test_date: meta_pattern("Test Date")?,
            subject: meta_pattern("Subject")?,
        })
    }

    /// Parse a full response-sheet page.
    pub fn parse(&self, html: &str) -> Result<ParsedSheet, SheetError> {
        let starts: Vec<usize> = self.panel_start.find_iter(html).map(|m| m.start()).collect();
        if starts.is_empty() {
            return Err(SheetError::NoQuestions);
        }

        let mut responses = Responses::new();
        let mut warnings = Vec::new();
        let mut questions_seen = 0usize;

        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            let Some(panel) = self.parse_panel(&html[start..end]) else {
                continue;
            };
            questions_seen += 1;

            if let Some(message) = panel.warning {
                warnings.push(SheetWarning {
                    question: Some(panel.question),
                    message,
                });
            }
            if let Some(submission) = panel.submission {
                if responses.insert(panel.question, submission).is_some() {
                    warnings.push(SheetWarning {
                        question: Some(panel.question),
                        message: "question appears more than once; kept the last panel".into(),
                    });
                }
            }
        }

        tracing::debug!(
            panels = starts.len(),
            questions_seen,
            answered = responses.len(),
            "parsed response sheet"
        );

        Ok(ParsedSheet {
            meta: self.parse_meta(html),
            responses,
            questions_seen,
            warnings,
        })
    }

    /// Candidate details from the sheet header; missing fields are empty.
    pub fn parse_meta(&self, html: &str) -> CandidateMeta {
        let find = |re: &Regex| {
            re.captures(html)
                .map(|c| c[1].trim().to_string())
                .unwrap_or_default()
        };
        CandidateMeta {
            candidate_id: find(&self.candidate_id),
            candidate_name: find(&self.candidate_name),
            test_date: find(&self.test_date),
            subject: find(&self.subject),
        }
    }

    fn question_number(&self, image_name: &str) -> Option<u32> {
        self.da_question
            .captures(image_name)
            .or_else(|| self.ga_question.captures(image_name))
            .and_then(|c| c[1].parse().ok())
    }

    fn option_map(&self, block: &str) -> HashMap<OptionLabel, OptionLabel> {
        self.option_image
            .captures_iter(block)
            .filter_map(|c| Some((c[1].parse().ok()?, c[2].parse().ok()?)))
            .collect()
    }

    fn parse_panel(&self, block: &str) -> Option<Panel> {
        let image = self.first_image.captures(block)?;
        let question = self.question_number(&image[1])?;
        let question_type: QuestionType = self.question_type.captures(block)?[1].parse().ok()?;

        let field = |re: &Regex| {
            re.captures(block)
                .map(|c| c[1].trim().to_string())
                .filter(|v| v != "--")
        };

        let mut panel = Panel {
            question,
            submission: None,
            warning: None,
        };

        match question_type {
            QuestionType::SingleCorrect | QuestionType::MultiCorrect => {
                let Some(chosen) = field(&self.chosen_option) else {
                    return Some(panel);
                };
                let options = self.option_map(block);
                let mut mapped = Vec::new();
                for shown in chosen.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match shown.parse::<OptionLabel>().ok().and_then(|l| options.get(&l)) {
                        Some(original) => mapped.push(*original),
                        None => {
                            panel.warning =
                                Some(format!("chosen option '{shown}' could not be mapped"));
                        }
                    }
                }
                panel.submission = match (question_type, mapped.first()) {
                    (_, None) => None,
                    (QuestionType::SingleCorrect, Some(first)) => Some(Submission::Single(*first)),
                    _ => Some(Submission::Multiple(mapped.into_iter().collect())),
                };
            }
            QuestionType::Numerical => {
                let Some(given) = field(&self.given_answer) else {
                    return Some(panel);
                };
                match given.parse::<f64>() {
                    Ok(value) if value.is_finite() => {
                        panel.submission = Some(Submission::Numeric(value));
                    }
                    _ => {
                        panel.warning = Some(format!("given answer '{given}' is not a number"));
                    }
                }
            }
        }

        Some(panel)
    }
}

struct Panel {
    question: u32,
    submission: Option<Submission>,
    warning: Option<String>,
}
