//! The answer key store.
//!
//! An immutable, validated lookup from question number to its scoring
//! definition. Built once and shared read-only between scoring calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;
use crate::model::{CorrectAnswer, Marks, QuestionType, Section};

/// Scoring definition of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub question_number: u32,
    pub answer: CorrectAnswer,
    /// Full-credit weight, 1 or 2.
    pub marks: u8,
    pub section: Section,
}

impl AnswerKeyEntry {
    pub fn question_type(&self) -> QuestionType {
        self.answer.question_type()
    }

    pub fn max_marks(&self) -> Marks {
        Marks::whole(self.marks)
    }
}

/// Answer key for one exam instance, covering questions `1..=len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKey {
    name: String,
    entries: Vec<AnswerKeyEntry>,
}

impl AnswerKey {
    /// Build a key, checking that every question in `1..=N` appears exactly once.
    pub fn new(name: impl Into<String>, entries: Vec<AnswerKeyEntry>) -> Result<Self, KeyError> {
        if entries.is_empty() {
            return Err(KeyError::Empty);
        }

        let mut by_number: BTreeMap<u32, AnswerKeyEntry> = BTreeMap::new();
        for entry in entries {
            validate_entry(&entry)?;
            let number = entry.question_number;
            if by_number.insert(number, entry).is_some() {
                return Err(KeyError::DuplicateQuestion(number));
            }
        }

        for (expected, &number) in (1u32..).zip(by_number.keys()) {
            if number != expected {
                return Err(KeyError::MissingQuestion(expected));
            }
        }

        Ok(Self {
            name: name.into(),
            entries: by_number.into_values().collect(),
        })
    }

    /// Human-readable exam name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a question; numbers outside `1..=len()` are an error.
    pub fn get(&self, question: u32) -> Result<&AnswerKeyEntry, KeyError> {
        question
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx as usize))
            .ok_or(KeyError::UnknownQuestion {
                question,
                count: self.len(),
            })
    }

    pub fn contains(&self, question: u32) -> bool {
        (1..=self.len()).contains(&question)
    }

    /// Number of questions, N.
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Always false for a constructed key; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in question-number order.
    pub fn entries(&self) -> &[AnswerKeyEntry] {
        &self.entries
    }

    pub fn max_marks(&self) -> Marks {
        self.entries.iter().map(AnswerKeyEntry::max_marks).sum()
    }

    pub fn section_max_marks(&self, section: Section) -> Marks {
        self.entries
            .iter()
            .filter(|e| e.section == section)
            .map(AnswerKeyEntry::max_marks)
            .sum()
    }

    pub fn count_by_type(&self, question_type: QuestionType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.question_type() == question_type)
            .count()
    }
}

fn validate_entry(entry: &AnswerKeyEntry) -> Result<(), KeyError> {
    let question = entry.question_number;
    if !(1..=2).contains(&entry.marks) {
        return Err(KeyError::InvalidMarks {
            question,
            marks: entry.marks,
        });
    }
    match &entry.answer {
        CorrectAnswer::Single { .. } => Ok(()),
        CorrectAnswer::Multiple { options } if options.is_empty() => Err(KeyError::InvalidAnswer {
            question,
            reason: "MSQ key has no options".into(),
        }),
        CorrectAnswer::Multiple { .. } => Ok(()),
        CorrectAnswer::Numerical { min, max } if !(min.is_finite() && max.is_finite()) => {
            Err(KeyError::InvalidAnswer {
                question,
                reason: "NAT range is not finite".into(),
            })
        }
        CorrectAnswer::Numerical { min, max } if min > max => Err(KeyError::InvalidAnswer {
            question,
            reason: format!("NAT range {min} to {max} is reversed"),
        }),
        CorrectAnswer::Numerical { .. } => Ok(()),
    }
}
