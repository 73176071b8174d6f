//! Evaluation pipeline.
//!
//! Fetches response sheets, parses and scores them against one answer key,
//! and records totals in the rank store. Many sheets can be evaluated at
//! once with bounded parallelism.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::answer_key::AnswerKey;
use crate::engine::MarkingEngine;
use crate::error::FetchError;
use crate::rank::RankTable;
use crate::report::Report;
use crate::sheet::{CandidateMeta, SheetParser, SheetWarning};
use crate::traits::{RankStore, SheetSource};

/// Configuration for the evaluator.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Maximum sheets fetched and scored at once.
    pub parallelism: usize,
    /// Retries on transient fetch errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time.
    pub retry_delay: Duration,
    /// Whether to upsert totals into the rank store.
    pub record_ranks: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            record_ranks: true,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_sheet_start(&self, location: &str);
    fn on_sheet_complete(&self, evaluation: &Evaluation);
    fn on_sheet_error(&self, location: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_sheet_start(&self, _: &str) {}
    fn on_sheet_complete(&self, _: &Evaluation) {}
    fn on_sheet_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// One scored response sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// URL or path the sheet was read from.
    pub location: String,
    pub evaluated_at: DateTime<Utc>,
    pub meta: CandidateMeta,
    pub report: Report,
    /// 1-based position in the rank table, when a store is configured.
    pub rank: Option<usize>,
    #[serde(default)]
    pub rank_table: Option<RankTable>,
    #[serde(default)]
    pub sheet_warnings: Vec<SheetWarning>,
}

/// Result of evaluating several sheets.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub evaluations: Vec<Evaluation>,
    /// `(location, error)` for every sheet that could not be evaluated.
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

/// Fetches, scores, and ranks response sheets against one answer key.
pub struct Evaluator {
    key: Arc<AnswerKey>,
    parser: SheetParser,
    source: Arc<dyn SheetSource>,
    store: Option<Arc<dyn RankStore>>,
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(
        key: Arc<AnswerKey>,
        source: Arc<dyn SheetSource>,
        store: Option<Arc<dyn RankStore>>,
        config: EvaluatorConfig,
    ) -> Result<Self> {
        let parser = SheetParser::new().context("failed to compile sheet patterns")?;
        Ok(Self {
            key,
            parser,
            source,
            store,
            config,
        })
    }

    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    /// Evaluate a single sheet.
    pub async fn evaluate(&self, location: &str) -> Result<Evaluation> {
        let html = self.fetch_with_retry(location).await?;
        let sheet = self
            .parser
            .parse(&html)
            .with_context(|| format!("failed to parse response sheet: {location}"))?;

        let mut sheet_warnings = sheet.warnings;
        if sheet.questions_seen != self.key.len() as usize {
            tracing::warn!(
                location,
                seen = sheet.questions_seen,
                expected = self.key.len(),
                "question count differs from answer key"
            );
            sheet_warnings.push(SheetWarning {
                question: None,
                message: format!(
                    "sheet has {} questions, answer key has {}",
                    sheet.questions_seen,
                    self.key.len()
                ),
            });
        }

        let report = MarkingEngine::new(&self.key).score(&sheet.responses);
        let (rank, rank_table) = self.record_rank(&sheet.meta, &report).await;

        tracing::info!(
            location,
            candidate = %sheet.meta.candidate_id,
            total = %report.total_marks,
            rank = ?rank,
            "sheet evaluated"
        );

        Ok(Evaluation {
            location: location.to_string(),
            evaluated_at: Utc::now(),
            meta: sheet.meta,
            report,
            rank,
            rank_table,
            sheet_warnings,
        })
    }

    /// Evaluate many sheets with bounded parallelism.
    ///
    /// A failing sheet is reported and skipped; it never aborts the batch.
    pub async fn evaluate_many(
        &self,
        locations: &[String],
        progress: &dyn ProgressReporter,
    ) -> BatchOutcome {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();
        for (idx, location) in locations.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let result = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_sheet_start(location);
                    self.evaluate(location).await
                }
                .await;
                (idx, location.clone(), result)
            });
        }

        let total = futures.len();
        let mut evaluations = Vec::new();
        let mut failures = Vec::new();

        while let Some((idx, location, result)) = futures.next().await {
            match result {
                Ok(evaluation) => {
                    progress.on_sheet_complete(&evaluation);
                    evaluations.push((idx, evaluation));
                }
                Err(e) => {
                    tracing::error!("evaluation failed for {location}: {e:#}");
                    progress.on_sheet_error(&location, &format!("{e:#}"));
                    failures.push((idx, (location, format!("{e:#}"))));
                }
            }
        }

        // Completion order varies run to run; report in input order.
        evaluations.sort_by_key(|(idx, _)| *idx);
        failures.sort_by_key(|(idx, _)| *idx);
        let mut outcome = BatchOutcome {
            evaluations: evaluations.into_iter().map(|(_, e)| e).collect(),
            failures: failures.into_iter().map(|(_, f)| f).collect(),
            ..BatchOutcome::default()
        };

        outcome.elapsed = start.elapsed();
        progress.on_batch_complete(
            total,
            outcome.evaluations.len(),
            outcome.failures.len(),
            outcome.elapsed,
        );
        outcome
    }

    /// Fetch with exponential backoff on transient failures.
    async fn fetch_with_retry(&self, location: &str) -> Result<String> {
        let mut retry_delay = self.config.retry_delay;
        let mut attempt = 0u32;
        loop {
            match self.source.fetch(location).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    let transient = e
                        .downcast_ref::<FetchError>()
                        .is_some_and(FetchError::is_transient);
                    if !transient || attempt >= self.config.max_retries {
                        return Err(e.context(format!("failed to fetch {location}")));
                    }
                    attempt += 1;
                    tracing::warn!(location, attempt, "transient fetch error, retrying: {e}");
                    tokio::time::sleep(retry_delay).await;
                    retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
                }
            }
        }
    }

    /// Store failures degrade to no rank.
    async fn record_rank(
        &self,
        meta: &CandidateMeta,
        report: &Report,
    ) -> (Option<usize>, Option<RankTable>) {
        let Some(store) = &self.store else {
            return (None, None);
        };

        let candidate_id = meta.candidate_id.trim();
        let result = if self.config.record_ranks && !candidate_id.is_empty() {
            store
                .upsert(candidate_id, report.total_marks.as_f64())
                .await
        } else {
            store.load().await
        };

        match result {
            Ok(table) => (table.position_of(candidate_id), Some(table)),
            Err(e) => {
                tracing::warn!(store = store.name(), "rank store unavailable: {e:#}");
                (None, None)
            }
        }
    }
}
