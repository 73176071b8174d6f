//! Summary statistics over many candidates' marks.
//!
//! Feeds the rank-table insights: mean, spread, percentiles, and a
//! fixed-bucket histogram of submitted totals.

use serde::{Deserialize, Serialize};

use crate::report::Report;

/// Number of histogram buckets used for the score distribution.
pub const DEFAULT_BUCKETS: usize = 14;

/// Percentile by linear interpolation between closest ranks.
///
/// `sorted` must be ascending and non-empty; `p` is in `0.0..=1.0`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let k = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let floor = k.floor();
    let ceil = k.ceil();
    let (lo, hi) = (floor as usize, ceil as usize);
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] * (ceil - k) + sorted[hi] * (k - floor)
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Descriptive statistics over a set of marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub samples: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub median: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Returns `None` when there are no finite values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Summary {
            samples: sorted.len(),
            mean,
            std_dev: variance.sqrt(),
            median: percentile(&sorted, 0.5),
            p90: percentile(&sorted, 0.9),
            min,
            max,
        })
    }

    /// Summary of the total marks of several reports.
    pub fn from_reports(reports: &[Report]) -> Option<Self> {
        let totals: Vec<f64> = reports.iter().map(|r| r.total_marks.as_f64()).collect();
        Self::from_values(&totals)
    }
}

/// Equal-width histogram of marks between the observed min and max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub min: f64,
    pub max: f64,
    pub bucket_width: f64,
    pub counts: Vec<usize>,
}

impl Distribution {
    /// Returns `None` when there are no finite values or `buckets` is zero.
    pub fn from_values(values: &[f64], buckets: usize) -> Option<Self> {
        if buckets == 0 {
            return None;
        }
        let sorted = sorted_finite(values);
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        let span = if max > min { max - min } else { 1.0 };
        let bucket_width = span / buckets as f64;

        let mut counts = vec![0usize; buckets];
        for v in &sorted {
            let idx = (((v - min) / bucket_width).floor() as usize).min(buckets - 1);
            counts[idx] += 1;
        }

        Some(Distribution {
            min,
            max,
            bucket_width,
            counts,
        })
    }

    /// Lower and upper edge of bucket `idx`.
    pub fn bucket_bounds(&self, idx: usize) -> (f64, f64) {
        let lo = self.min + self.bucket_width * idx as f64;
        (lo, lo + self.bucket_width)
    }

    pub fn tallest(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}
