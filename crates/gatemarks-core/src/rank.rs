//! Public rank table built from stored candidate totals.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::statistics::{Distribution, Summary, DEFAULT_BUCKETS};

/// One candidate's stored total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub candidate_id: String,
    pub marks: f64,
}

/// Candidates ordered by marks, highest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankTable {
    entries: Vec<RankEntry>,
}

impl RankTable {
    /// Build a table, dropping blank ids and ordering by marks descending.
    ///
    /// Ties are broken by candidate id so the order is stable across loads.
    pub fn from_entries(entries: impl IntoIterator<Item = RankEntry>) -> Self {
        let mut entries: Vec<RankEntry> = entries
            .into_iter()
            .filter_map(|e| {
                let id = e.candidate_id.trim();
                (!id.is_empty()).then(|| RankEntry {
                    candidate_id: id.to_string(),
                    marks: if e.marks.is_finite() { e.marks } else { 0.0 },
                })
            })
            .collect();
        entries.sort_by(compare_entries);
        Self { entries }
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based rank of a candidate, if present.
    pub fn position_of(&self, candidate_id: &str) -> Option<usize> {
        let id = candidate_id.trim();
        self.entries
            .iter()
            .position(|e| e.candidate_id == id)
            .map(|idx| idx + 1)
    }

    /// Insert or replace a candidate's marks, keeping the order.
    pub fn upsert(&mut self, candidate_id: &str, marks: f64) {
        let id = candidate_id.trim();
        if id.is_empty() {
            return;
        }
        self.entries.retain(|e| e.candidate_id != id);
        self.entries.push(RankEntry {
            candidate_id: id.to_string(),
            marks: if marks.is_finite() { marks } else { 0.0 },
        });
        self.entries.sort_by(compare_entries);
    }

    pub fn marks(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.marks).collect()
    }

    pub fn summary(&self) -> Option<Summary> {
        Summary::from_values(&self.marks())
    }

    pub fn distribution(&self) -> Option<Distribution> {
        Distribution::from_values(&self.marks(), DEFAULT_BUCKETS)
    }
}

fn compare_entries(a: &RankEntry, b: &RankEntry) -> Ordering {
    b.marks
        .total_cmp(&a.marks)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}
