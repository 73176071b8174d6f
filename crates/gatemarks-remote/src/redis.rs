//! Redis-backed rank store.

use std::collections::HashMap;
use std::sync::Arc;

use ::redis::aio::ConnectionManager;
use ::redis::{cmd, Client, RedisError};
use async_trait::async_trait;
use tokio::sync::RwLock;

use gatemarks_core::error::StoreError;
use gatemarks_core::rank::{RankEntry, RankTable};
use gatemarks_core::traits::RankStore;

use crate::RANKS_KEY;

/// Stores totals in a Redis hash of candidate id to marks.
///
/// The connection is opened on first use and shared afterwards.
#[derive(Clone)]
pub struct RedisRankStore {
    client: Client,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

impl RedisRankStore {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let client = Client::open(url).map_err(redis_error)?;
        Ok(Self {
            client,
            manager: Arc::new(RwLock::new(None)),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        if let Some(manager) = self.manager.read().await.clone() {
            return Ok(manager);
        }

        let mut guard = self.manager.write().await;
        if let Some(manager) = guard.clone() {
            return Ok(manager);
        }
        let manager = ConnectionManager::new(self.client.clone())
            .await
            .map_err(redis_error)?;
        tracing::debug!("connected to redis rank store");
        *guard = Some(manager.clone());
        Ok(manager)
    }
}

fn redis_error(err: RedisError) -> StoreError {
    StoreError::Redis(err.to_string())
}

/// Build a table from the raw hash; unparseable marks count as zero.
pub(crate) fn table_from_hash(mapping: HashMap<String, String>) -> RankTable {
    RankTable::from_entries(mapping.into_iter().map(|(candidate_id, raw)| RankEntry {
        candidate_id,
        marks: raw.trim().parse().unwrap_or(0.0),
    }))
}

#[async_trait]
impl RankStore for RedisRankStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn load(&self) -> anyhow::Result<RankTable> {
        let mut manager = self.connection().await?;
        let mapping: HashMap<String, String> = cmd("HGETALL")
            .arg(RANKS_KEY)
            .query_async::<_, HashMap<String, String>>(&mut manager)
            .await
            .map_err(redis_error)?;
        Ok(table_from_hash(mapping))
    }

    async fn upsert(&self, candidate_id: &str, marks: f64) -> anyhow::Result<RankTable> {
        let mut manager = self.connection().await?;
        cmd("HSET")
            .arg(RANKS_KEY)
            .arg(candidate_id.trim())
            .arg(format!("{marks:.6}"))
            .query_async::<_, i64>(&mut manager)
            .await
            .map_err(redis_error)?;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        let err = RedisRankStore::new("not a redis url").err().unwrap();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Redis(_))
        ));
    }

    #[test]
    fn table_from_raw_hash() {
        let mapping = HashMap::from([
            ("DA1".to_string(), "40.500000".to_string()),
            ("DA2".to_string(), "garbage".to_string()),
            (" ".to_string(), "99".to_string()),
            ("DA3".to_string(), "72.000000".to_string()),
        ]);
        let table = table_from_hash(mapping);
        assert_eq!(table.len(), 3);
        assert_eq!(table.position_of("DA3"), Some(1));
        assert_eq!(table.entries()[2].marks, 0.0);
    }
}
