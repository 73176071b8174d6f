//! Error types shared across gatemarks crates.
//!
//! Fetch and store errors are defined here rather than in `gatemarks-remote`
//! so the pipeline can downcast and classify them for retry decisions.

use thiserror::Error;

use crate::model::QuestionType;

/// Errors raised by the answer key store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeyError {
    /// A lookup outside the key's fixed range.
    #[error("question {question} is outside the answer key range 1..={count}")]
    UnknownQuestion { question: u32, count: u32 },

    #[error("answer key has no questions")]
    Empty,

    #[error("answer key has no entry for question {0}")]
    MissingQuestion(u32),

    #[error("question {0} appears more than once in the answer key")]
    DuplicateQuestion(u32),

    #[error("question {question} has invalid marks {marks} (expected 1 or 2)")]
    InvalidMarks { question: u32, marks: u8 },

    #[error("question {question} has an invalid key: {reason}")]
    InvalidAnswer { question: u32, reason: String },
}

/// Errors raised while marking a single question.
///
/// The engine never lets one of these abort a report; it downgrades the
/// question to unanswered and records a diagnostic instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("question {question}: {found} submission does not fit a {expected} question")]
    MalformedResponseShape {
        question: u32,
        expected: QuestionType,
        found: &'static str,
    },
}

/// Errors raised while parsing a response sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("no question panels found in response sheet")]
    NoQuestions,

    #[error("invalid sheet pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors that can occur when fetching a response sheet.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("response URL must start with http:// or https://, got '{0}'")]
    InvalidScheme(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("response sheet request failed (HTTP {status})")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read response sheet {path}: {message}")]
    Io { path: String, message: String },
}

impl FetchError {
    /// Returns `true` if the same request may succeed when retried.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::Http { status } => *status == 429 || *status >= 500,
            FetchError::InvalidScheme(_) | FetchError::Io { .. } => false,
        }
    }
}

/// Errors that can occur when talking to a rank store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rank storage unavailable: {0}")]
    Unavailable(String),

    #[error("redis error: {0}")]
    Redis(String),

    #[error("rank store API error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    #[error("failed to decode rank store response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_fetch_errors() {
        assert!(FetchError::Timeout(30).is_transient());
        assert!(FetchError::Http { status: 503 }.is_transient());
        assert!(FetchError::Http { status: 429 }.is_transient());
        assert!(!FetchError::Http { status: 404 }.is_transient());
        assert!(!FetchError::InvalidScheme("ftp://x".into()).is_transient());
    }

    #[test]
    fn shape_error_message_names_question() {
        let err = ScoreError::MalformedResponseShape {
            question: 7,
            expected: QuestionType::SingleCorrect,
            found: "option set",
        };
        assert_eq!(
            err.to_string(),
            "question 7: option set submission does not fit a MCQ question"
        );
    }
}
