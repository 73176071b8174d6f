//! In-process rank store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use gatemarks_core::rank::RankTable;
use gatemarks_core::traits::RankStore;

/// Keeps totals in memory for the lifetime of the process.
///
/// Used when no shared store is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryRankStore {
    table: RwLock<RankTable>,
}

impl MemoryRankStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: RankTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }
}

#[async_trait]
impl RankStore for MemoryRankStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> anyhow::Result<RankTable> {
        Ok(self.table.read().await.clone())
    }

    async fn upsert(&self, candidate_id: &str, marks: f64) -> anyhow::Result<RankTable> {
        let mut table = self.table.write().await;
        table.upsert(candidate_id, marks);
        Ok(table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatemarks_core::rank::RankEntry;

    #[tokio::test]
    async fn upsert_then_load() {
        let store = MemoryRankStore::with_table(RankTable::from_entries(vec![RankEntry {
            candidate_id: "DA1".into(),
            marks: 60.0,
        }]));

        let table = store.upsert("DA2", 72.5).await.unwrap();
        assert_eq!(table.position_of("DA2"), Some(1));

        store.upsert("DA2", 12.0).await.unwrap();
        let table = store.load().await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.position_of("DA2"), Some(2));
    }
}
