//! Scored report types with JSON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Marks, Section};
use crate::results::{Diagnostic, ScoredQuestion, Status};

/// A complete scored report for one candidate.
///
/// Produced by [`MarkingEngine::score`](crate::engine::MarkingEngine::score);
/// contains no timestamps or identifiers so identical inputs give identical
/// reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Name of the answer key this report was scored against.
    pub exam: String,
    /// Exact sum of `marks_awarded`; may be negative.
    pub total_marks: Marks,
    pub max_marks: Marks,
    pub section_totals: BTreeMap<Section, SectionScore>,
    pub attempted_count: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub partial_count: u32,
    pub unanswered_count: u32,
    /// `correct_count / attempted_count`, or 0 when nothing was attempted.
    pub accuracy: f64,
    /// Ordered by question number.
    pub per_question: Vec<ScoredQuestion>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Marks earned in one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScore {
    pub marks: Marks,
    pub max_marks: Marks,
}

impl Report {
    pub fn section_marks(&self, section: Section) -> Marks {
        self.section_totals
            .get(&section)
            .map(|s| s.marks)
            .unwrap_or_default()
    }

    pub fn section_max_marks(&self, section: Section) -> Marks {
        self.section_totals
            .get(&section)
            .map(|s| s.max_marks)
            .unwrap_or_default()
    }

    /// Questions with the given status, in order.
    pub fn with_status(&self, status: Status) -> impl Iterator<Item = &ScoredQuestion> {
        self.per_question.iter().filter(move |q| q.status == status)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: Report =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the summary as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**{}:** {:+.2} / {:.2}\n\n",
            self.exam,
            self.total_marks.as_f64(),
            self.max_marks.as_f64()
        ));

        md.push_str("| Section | Marks | Max |\n");
        md.push_str("|---------|-------|-----|\n");
        for (section, score) in &self.section_totals {
            md.push_str(&format!(
                "| {} | {:+.2} | {:.2} |\n",
                section,
                score.marks.as_f64(),
                score.max_marks.as_f64()
            ));
        }
        md.push('\n');

        md.push_str(&format!(
            "Correct {}, partial {}, wrong {}, unanswered {} (accuracy {:.1}%)\n",
            self.correct_count,
            self.partial_count,
            self.incorrect_count,
            self.unanswered_count,
            self.accuracy * 100.0
        ));

        if !self.diagnostics.is_empty() {
            md.push_str("\n### Diagnostics\n\n");
            for d in &self.diagnostics {
                md.push_str(&format!("- Q{}: {}\n", d.question_number, d.message));
            }
        }

        md
    }
}
