//! Core data model types for gatemarks.
//!
//! These are the fundamental types the whole system uses to describe the
//! exam paper, a candidate's submissions, and exact mark arithmetic.

use std::collections::BTreeSet;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Paper section a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    /// General Aptitude.
    GA,
    /// Data Science and Artificial Intelligence.
    DA,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::GA, Section::DA];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::GA => write!(f, "GA"),
            Section::DA => write!(f, "DA"),
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GA" => Ok(Section::GA),
            "DA" => Ok(Section::DA),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

/// How a question is answered and therefore how it is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// Multiple choice, exactly one correct option.
    #[serde(rename = "MCQ")]
    SingleCorrect,
    /// Multiple select, one or more correct options.
    #[serde(rename = "MSQ")]
    MultiCorrect,
    /// Numerical answer within a tolerance window.
    #[serde(rename = "NAT")]
    Numerical,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::SingleCorrect => write!(f, "MCQ"),
            QuestionType::MultiCorrect => write!(f, "MSQ"),
            QuestionType::Numerical => write!(f, "NAT"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "single" | "single_correct" => Ok(QuestionType::SingleCorrect),
            "msq" | "multi" | "multi_correct" => Ok(QuestionType::MultiCorrect),
            "nat" | "numerical" | "numeric" => Ok(QuestionType::Numerical),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// An option label printed on the paper (A to D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionLabel(char);

impl OptionLabel {
    pub const A: OptionLabel = OptionLabel('A');
    pub const B: OptionLabel = OptionLabel('B');
    pub const C: OptionLabel = OptionLabel('C');
    pub const D: OptionLabel = OptionLabel('D');

    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if ('A'..='D').contains(&c.to_ascii_uppercase()) => {
                Ok(OptionLabel(c.to_ascii_uppercase()))
            }
            _ => Err(format!("unknown option label: {trimmed}")),
        }
    }
}

impl TryFrom<String> for OptionLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OptionLabel> for String {
    fn from(label: OptionLabel) -> Self {
        label.0.to_string()
    }
}

/// Parse a list of labels separated by `,` or `;` into a set.
pub fn parse_label_set(s: &str) -> Result<BTreeSet<OptionLabel>, String> {
    s.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

fn join_labels(labels: &BTreeSet<OptionLabel>) -> String {
    labels
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Half-width of the window accepted around a single NAT key value.
pub const NAT_TOLERANCE: f64 = 0.01;

/// The correct answer for one question, tagged by question type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectAnswer {
    Single { option: OptionLabel },
    Multiple { options: BTreeSet<OptionLabel> },
    /// Inclusive range.
    Numerical { min: f64, max: f64 },
}

impl CorrectAnswer {
    /// A NAT key given as one value rather than a range.
    pub fn numerical_exact(value: f64) -> Self {
        CorrectAnswer::Numerical {
            min: value - NAT_TOLERANCE,
            max: value + NAT_TOLERANCE,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            CorrectAnswer::Single { .. } => QuestionType::SingleCorrect,
            CorrectAnswer::Multiple { .. } => QuestionType::MultiCorrect,
            CorrectAnswer::Numerical { .. } => QuestionType::Numerical,
        }
    }
}

impl fmt::Display for CorrectAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectAnswer::Single { option } => write!(f, "{option}"),
            CorrectAnswer::Multiple { options } => write!(f, "{}", join_labels(options)),
            CorrectAnswer::Numerical { min, max } => write!(f, "{min} to {max}"),
        }
    }
}

/// A candidate's normalized answer to one question.
///
/// An unanswered question has no `Submission` at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Submission {
    Single(OptionLabel),
    Multiple(BTreeSet<OptionLabel>),
    Numeric(f64),
}

impl Submission {
    /// Short name of the submission's shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Submission::Single(_) => "single option",
            Submission::Multiple(_) => "option set",
            Submission::Numeric(_) => "numeric",
        }
    }
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Submission::Single(label) => write!(f, "{label}"),
            Submission::Multiple(labels) => write!(f, "{}", join_labels(labels)),
            Submission::Numeric(value) => write!(f, "{value}"),
        }
    }
}

/// Exact signed marks, stored in twelfths of a mark.
///
/// Twelfths make thirds (negative marking) and the halves and quarters of
/// MSQ partial credit exact, so totals never drift.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "f64", into = "f64")]
pub struct Marks(i64);

impl Marks {
    pub const PARTS: i64 = 12;
    pub const ZERO: Marks = Marks(0);

    pub fn whole(marks: u8) -> Self {
        Marks(i64::from(marks) * Self::PARTS)
    }

    pub fn from_twelfths(twelfths: i64) -> Self {
        Marks(twelfths)
    }

    pub fn twelfths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::PARTS as f64
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

impl From<f64> for Marks {
    fn from(value: f64) -> Self {
        Marks((value * Self::PARTS as f64).round() as i64)
    }
}

impl From<Marks> for f64 {
    fn from(marks: Marks) -> Self {
        marks.as_f64()
    }
}

impl Add for Marks {
    type Output = Marks;

    fn add(self, rhs: Marks) -> Marks {
        Marks(self.0 + rhs.0)
    }
}

impl AddAssign for Marks {
    fn add_assign(&mut self, rhs: Marks) {
        self.0 += rhs.0;
    }
}

impl Neg for Marks {
    type Output = Marks;

    fn neg(self) -> Marks {
        Marks(-self.0)
    }
}

impl Sum for Marks {
    fn sum<I: Iterator<Item = Marks>>(iter: I) -> Marks {
        iter.fold(Marks::ZERO, Add::add)
    }
}

/// Fixed layout of the GATE DA paper.
pub mod gate_da {
    use super::Section;

    pub const QUESTION_COUNT: u32 = 65;
    pub const GA_MAX_MARKS: u8 = 15;
    pub const DA_MAX_MARKS: u8 = 85;

    /// Full-credit weight of a question number.
    pub fn marks_for(question: u32) -> u8 {
        match question {
            0..=5 => 1,
            6..=10 => 2,
            11..=35 => 1,
            _ => 2,
        }
    }

    pub fn section_for(question: u32) -> Section {
        if question <= 10 {
            Section::GA
        } else {
            Section::DA
        }
    }
}
