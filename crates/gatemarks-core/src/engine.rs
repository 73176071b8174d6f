//! The marking engine.
//!
//! Maps a candidate's normalized responses plus an [`AnswerKey`] into a
//! [`Report`], applying GATE negative marking and MSQ partial credit.
//! Scoring is a single pure pass over the key; nothing here does I/O.

use std::collections::{BTreeMap, BTreeSet};

use crate::answer_key::{AnswerKey, AnswerKeyEntry};
use crate::error::ScoreError;
use crate::model::{CorrectAnswer, Marks, OptionLabel, Section, Submission};
use crate::report::{Report, SectionScore};
use crate::results::{Diagnostic, ScoredQuestion, Status};

/// Normalized responses keyed by question number. Missing keys are unanswered.
pub type Responses = BTreeMap<u32, Submission>;

/// Scores response sets against one answer key.
#[derive(Debug, Clone, Copy)]
pub struct MarkingEngine<'k> {
    key: &'k AnswerKey,
}

impl<'k> MarkingEngine<'k> {
    pub fn new(key: &'k AnswerKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &'k AnswerKey {
        self.key
    }

    /// Score one candidate's responses.
    ///
    /// Responses for question numbers outside the key are ignored. A
    /// submission whose shape does not fit its question is scored as
    /// unanswered and reported in [`Report::diagnostics`].
    pub fn score(&self, responses: &Responses) -> Report {
        let ignored = responses.keys().filter(|&&q| !self.key.contains(q)).count();
        if ignored > 0 {
            tracing::debug!(ignored, "ignoring responses outside the answer key range");
        }

        let mut sections: BTreeMap<Section, SectionScore> = Section::ALL
            .iter()
            .map(|&s| {
                (
                    s,
                    SectionScore {
                        marks: Marks::ZERO,
                        max_marks: self.key.section_max_marks(s),
                    },
                )
            })
            .collect();

        let mut per_question = Vec::with_capacity(self.key.entries().len());
        let mut diagnostics = Vec::new();
        let mut total = Marks::ZERO;
        let (mut correct, mut incorrect, mut partial, mut unanswered) = (0u32, 0u32, 0u32, 0u32);

        for entry in self.key.entries() {
            let submitted = responses.get(&entry.question_number);
            let (status, marks_awarded) = match submitted {
                None => (Status::Unanswered, Marks::ZERO),
                Some(submission) => match mark_question(entry, submission) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        tracing::warn!(question = entry.question_number, "{err}");
                        diagnostics.push(Diagnostic::from(&err));
                        (Status::Unanswered, Marks::ZERO)
                    }
                },
            };

            match status {
                Status::Correct => correct += 1,
                Status::Incorrect => incorrect += 1,
                Status::Partial => partial += 1,
                Status::Unanswered => unanswered += 1,
            }
            total += marks_awarded;
            sections.entry(entry.section).or_default().marks += marks_awarded;

            per_question.push(ScoredQuestion {
                question_number: entry.question_number,
                section: entry.section,
                question_type: entry.question_type(),
                max_marks: entry.max_marks(),
                submitted: submitted.cloned(),
                key: entry.answer.clone(),
                status,
                marks_awarded,
            });
        }

        let attempted = correct + incorrect + partial;
        let accuracy = if attempted == 0 {
            0.0
        } else {
            f64::from(correct) / f64::from(attempted)
        };

        Report {
            exam: self.key.name().to_string(),
            total_marks: total,
            max_marks: self.key.max_marks(),
            section_totals: sections,
            attempted_count: attempted,
            correct_count: correct,
            incorrect_count: incorrect,
            partial_count: partial,
            unanswered_count: unanswered,
            accuracy,
            per_question,
            diagnostics,
        }
    }
}

/// Mark a single submitted answer against its key entry.
///
/// Dispatches on the key's question type; a submission of the wrong shape
/// is a [`ScoreError::MalformedResponseShape`].
pub fn mark_question(
    entry: &AnswerKeyEntry,
    submitted: &Submission,
) -> Result<(Status, Marks), ScoreError> {
    let full = entry.max_marks();
    match (&entry.answer, submitted) {
        (CorrectAnswer::Single { option }, Submission::Single(chosen)) => {
            Ok(mark_single(*option, *chosen, full))
        }
        (CorrectAnswer::Multiple { options }, Submission::Multiple(chosen)) => {
            Ok(mark_multiple(options, chosen, full))
        }
        (CorrectAnswer::Numerical { min, max }, Submission::Numeric(value)) => {
            Ok(mark_numerical(*min, *max, *value, full))
        }
        (answer, other) => Err(ScoreError::MalformedResponseShape {
            question: entry.question_number,
            expected: answer.question_type(),
            found: other.shape(),
        }),
    }
}

/// MCQ: full marks or a deduction of one third of the weight.
fn mark_single(key: OptionLabel, chosen: OptionLabel, full: Marks) -> (Status, Marks) {
    if chosen == key {
        (Status::Correct, full)
    } else {
        (Status::Incorrect, -Marks::from_twelfths(full.twelfths() / 3))
    }
}

/// MSQ: no negative marking; a clean proper subset earns proportional credit.
fn mark_multiple(
    key: &BTreeSet<OptionLabel>,
    chosen: &BTreeSet<OptionLabel>,
    full: Marks,
) -> (Status, Marks) {
    if chosen.is_empty() {
        return (Status::Unanswered, Marks::ZERO);
    }
    if chosen == key {
        return (Status::Correct, full);
    }
    if !chosen.is_subset(key) {
        return (Status::Incorrect, Marks::ZERO);
    }
    // Options run A to D, so |key| divides twelve and the share is exact.
    let share = full.twelfths() * chosen.len() as i64 / key.len() as i64;
    (Status::Partial, Marks::from_twelfths(share))
}

/// Slack for bounds like `2.3 + 0.01` that land just inside their decimal value.
const BOUND_EPSILON: f64 = 1e-9;

/// NAT: inclusive range check, no negative marking.
fn mark_numerical(min: f64, max: f64, value: f64, full: Marks) -> (Status, Marks) {
    if (min - BOUND_EPSILON..=max + BOUND_EPSILON).contains(&value) {
        (Status::Correct, full)
    } else {
        (Status::Incorrect, Marks::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer_key::tests::{entry, sample_key};
    use crate::model::QuestionType;

    fn labels(s: &[OptionLabel]) -> Submission {
        Submission::Multiple(s.iter().copied().collect())
    }

    fn approx(marks: Marks, expected: f64) -> bool {
        (marks.as_f64() - expected).abs() < 0.005
    }

    #[test]
    fn wrong_mcq_deducts_a_third_of_weight() {
        let one = entry(1, CorrectAnswer::Single { option: OptionLabel::B }, 1);
        let two = entry(2, CorrectAnswer::Single { option: OptionLabel::B }, 2);

        let (status, marks) = mark_question(&one, &Submission::Single(OptionLabel::C)).unwrap();
        assert_eq!(status, Status::Incorrect);
        assert!(approx(marks, -1.0 / 3.0));

        let (_, marks) = mark_question(&two, &Submission::Single(OptionLabel::A)).unwrap();
        assert_eq!(marks, Marks::from_twelfths(-8));
        assert!(approx(marks, -2.0 / 3.0));

        let (status, marks) = mark_question(&two, &Submission::Single(OptionLabel::B)).unwrap();
        assert_eq!((status, marks), (Status::Correct, Marks::whole(2)));
    }

    #[test]
    fn msq_exact_partial_and_wrong() {
        let key = sample_key();
        let q2 = key.get(2).unwrap();

        let exact = mark_question(q2, &labels(&[OptionLabel::A, OptionLabel::C])).unwrap();
        assert_eq!(exact, (Status::Correct, Marks::whole(2)));

        let subset = mark_question(q2, &labels(&[OptionLabel::A])).unwrap();
        assert_eq!(subset, (Status::Partial, Marks::whole(1)));

        let wrong = mark_question(q2, &labels(&[OptionLabel::A, OptionLabel::B])).unwrap();
        assert_eq!(wrong, (Status::Incorrect, Marks::ZERO));

        let empty = mark_question(q2, &labels(&[])).unwrap();
        assert_eq!(empty, (Status::Unanswered, Marks::ZERO));
    }

    #[test]
    fn msq_partial_credit_in_thirds() {
        let q = entry(
            1,
            CorrectAnswer::Multiple {
                options: BTreeSet::from([OptionLabel::A, OptionLabel::B, OptionLabel::D]),
            },
            1,
        );
        let (status, marks) = mark_question(&q, &labels(&[OptionLabel::B, OptionLabel::D])).unwrap();
        assert_eq!(status, Status::Partial);
        assert_eq!(marks, Marks::from_twelfths(8));
    }

    #[test]
    fn nat_boundaries_are_inclusive() {
        let key = sample_key();
        let q3 = key.get(3).unwrap();

        for value in [4.9, 5.05, 5.1] {
            let (status, marks) = mark_question(q3, &Submission::Numeric(value)).unwrap();
            assert_eq!(status, Status::Correct, "{value} should be inside the range");
            assert_eq!(marks, Marks::whole(2));
        }
        for value in [3.9, 6.1] {
            let (status, marks) = mark_question(q3, &Submission::Numeric(value)).unwrap();
            assert_eq!((status, marks), (Status::Incorrect, Marks::ZERO));
        }
    }

    #[test]
    fn single_value_nat_key_accepts_both_decimal_bounds() {
        for key in [2.3, 0.7, 45.6, 99.9] {
            let q = entry(40, CorrectAnswer::numerical_exact(key), 2);
            let lower = ((key - 0.01) * 100.0).round() / 100.0;
            let upper = ((key + 0.01) * 100.0).round() / 100.0;
            for value in [lower, key, upper] {
                let (status, marks) = mark_question(&q, &Submission::Numeric(value)).unwrap();
                assert_eq!(status, Status::Correct, "{value} against key {key}");
                assert_eq!(marks, Marks::whole(2));
            }
        }

        let q = entry(40, CorrectAnswer::numerical_exact(2.3), 2);
        for value in [2.28, 2.32] {
            let (status, marks) = mark_question(&q, &Submission::Numeric(value)).unwrap();
            assert_eq!((status, marks), (Status::Incorrect, Marks::ZERO), "{value}");
        }
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let key = sample_key();
        let err = mark_question(key.get(1).unwrap(), &labels(&[OptionLabel::B])).unwrap_err();
        assert_eq!(
            err,
            ScoreError::MalformedResponseShape {
                question: 1,
                expected: QuestionType::SingleCorrect,
                found: "option set",
            }
        );
    }

    #[test]
    fn scenario_report() {
        let key = sample_key();
        let responses = Responses::from([
            (1, Submission::Single(OptionLabel::C)),
            (2, labels(&[OptionLabel::A])),
            (3, Submission::Numeric(5.05)),
        ]);

        let report = MarkingEngine::new(&key).score(&responses);
        let statuses: Vec<Status> = report.per_question.iter().map(|q| q.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Incorrect, Status::Partial, Status::Correct, Status::Unanswered]
        );
        assert!(approx(report.per_question[0].marks_awarded, -0.333));
        assert_eq!(report.per_question[1].marks_awarded, Marks::whole(1));
        assert_eq!(report.per_question[2].marks_awarded, Marks::whole(2));
        assert_eq!(report.per_question[3].marks_awarded, Marks::ZERO);

        assert_eq!(report.attempted_count, 3);
        assert_eq!(report.correct_count, 1);
        assert_eq!(report.incorrect_count, 1);
        assert_eq!(report.partial_count, 1);
        assert_eq!(report.unanswered_count, 1);
        assert!((report.accuracy - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.total_marks, Marks::from_twelfths(-4 + 12 + 24));
    }

    #[test]
    fn total_equals_sum_of_questions_and_sections() {
        let key = sample_key();
        let responses = Responses::from([
            (1, Submission::Single(OptionLabel::A)),
            (2, labels(&[OptionLabel::C])),
            (4, Submission::Single(OptionLabel::A)),
        ]);
        let report = MarkingEngine::new(&key).score(&responses);

        let sum: Marks = report.per_question.iter().map(|q| q.marks_awarded).sum();
        assert_eq!(sum, report.total_marks);
        let sections: Marks = report.section_totals.values().map(|s| s.marks).sum();
        assert_eq!(sections, report.total_marks);
        assert_eq!(report.section_marks(Section::GA), Marks::from_twelfths(-4));
    }

    #[test]
    fn nothing_attempted_gives_zero_accuracy() {
        let key = sample_key();
        let report = MarkingEngine::new(&key).score(&Responses::new());
        assert_eq!(report.attempted_count, 0);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.total_marks, Marks::ZERO);
        assert_eq!(report.unanswered_count, 4);
    }

    #[test]
    fn out_of_range_responses_are_ignored() {
        let key = sample_key();
        let responses = Responses::from([
            (0, Submission::Single(OptionLabel::A)),
            (99, Submission::Numeric(1.0)),
        ]);
        let report = MarkingEngine::new(&key).score(&responses);
        assert_eq!(report.per_question.len(), 4);
        assert_eq!(report.attempted_count, 0);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn malformed_submission_degrades_to_unanswered() {
        let key = sample_key();
        let responses = Responses::from([
            (1, labels(&[OptionLabel::B])),
            (3, Submission::Numeric(5.0)),
        ]);
        let report = MarkingEngine::new(&key).score(&responses);

        assert_eq!(report.per_question[0].status, Status::Unanswered);
        assert_eq!(report.per_question[0].marks_awarded, Marks::ZERO);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].question_number, 1);
        assert_eq!(report.correct_count, 1);
        assert_eq!(report.attempted_count, 1);
    }

    #[test]
    fn scoring_is_idempotent() {
        let key = sample_key();
        let responses = Responses::from([
            (1, Submission::Single(OptionLabel::B)),
            (2, labels(&[OptionLabel::C])),
            (4, Submission::Single(OptionLabel::A)),
        ]);
        let engine = MarkingEngine::new(&key);
        assert_eq!(engine.score(&responses), engine.score(&responses));
    }
}
