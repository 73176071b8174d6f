//! Per-question scoring results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::model::{CorrectAnswer, Marks, QuestionType, Section, Submission};

/// Outcome of marking one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Correct,
    Incorrect,
    Unanswered,
    /// Only possible for MSQ.
    Partial,
}

impl Status {
    /// Whether the question counts towards `attempted_count`.
    pub fn is_attempted(self) -> bool {
        !matches!(self, Status::Unanswered)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Correct => write!(f, "CORRECT"),
            Status::Incorrect => write!(f, "INCORRECT"),
            Status::Unanswered => write!(f, "UNANSWERED"),
            Status::Partial => write!(f, "PARTIAL"),
        }
    }
}

/// One question's line in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredQuestion {
    pub question_number: u32,
    pub section: Section,
    pub question_type: QuestionType,
    /// Full-credit weight.
    pub max_marks: Marks,
    /// What the candidate submitted, if anything.
    #[serde(default)]
    pub submitted: Option<Submission>,
    pub key: CorrectAnswer,
    pub status: Status,
    pub marks_awarded: Marks,
}

/// A question whose submission could not be marked as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub question_number: u32,
    pub message: String,
}

impl From<&ScoreError> for Diagnostic {
    fn from(err: &ScoreError) -> Self {
        match err {
            ScoreError::MalformedResponseShape { question, .. } => Diagnostic {
                question_number: *question,
                message: err.to_string(),
            },
        }
    }
}
