//! Collaborator seams for fetching sheets and persisting ranks.
//!
//! Implemented by the `gatemarks-remote` crate. Scoring itself stays
//! synchronous; only these I/O boundaries are async.

use async_trait::async_trait;

use crate::rank::RankTable;

/// Anything that can produce the raw HTML of a response sheet.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Human-readable source name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch the sheet at `location`, a URL or a file path.
    ///
    /// Failures should carry a [`FetchError`](crate::error::FetchError) so
    /// the pipeline can tell transient failures from permanent ones.
    async fn fetch(&self, location: &str) -> anyhow::Result<String>;
}

/// Persistent store of candidate totals backing the rank table.
#[async_trait]
pub trait RankStore: Send + Sync {
    /// Human-readable store name (e.g. "redis").
    fn name(&self) -> &str;

    /// Load every stored total.
    async fn load(&self) -> anyhow::Result<RankTable>;

    /// Record a candidate's total and return the updated table.
    async fn upsert(&self, candidate_id: &str, marks: f64) -> anyhow::Result<RankTable>;
}
