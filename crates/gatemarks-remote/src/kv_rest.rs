//! Rank store over a Redis-compatible REST API (Upstash / Vercel KV).
//!
//! Each command is a GET whose path segments are the command and its
//! arguments, authorized with a bearer token. Replies are `{"result": ...}`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::instrument;

use gatemarks_core::error::StoreError;
use gatemarks_core::rank::{RankEntry, RankTable};
use gatemarks_core::traits::RankStore;

use crate::RANKS_KEY;

const DEFAULT_TIMEOUT_SECS: u64 = 12;

/// REST-backed rank store.
pub struct KvRestRankStore {
    base_url: Url,
    token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for KvRestRankStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvRestRankStore")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct KvReply {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

impl KvRestRankStore {
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url.trim().trim_end_matches('/'))
            .with_context(|| format!("invalid KV REST URL: {base_url}"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url,
            token: token.trim().to_string(),
            client,
        })
    }

    /// URL for a command; every segment is percent-encoded.
    fn command_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::Unavailable(format!("cannot use {} as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn command(&self, segments: &[&str]) -> Result<serde_json::Value, StoreError> {
        let url = self.command_url(segments)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Http { status, message });
        }

        let reply: KvReply = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        if let Some(error) = reply.error {
            return Err(StoreError::Http {
                status,
                message: error,
            });
        }
        Ok(reply.result)
    }
}

fn value_to_marks(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn value_to_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `HGETALL` replies are a flat `[field, value, field, value, ...]` list.
fn table_from_flat(result: serde_json::Value) -> Result<RankTable, StoreError> {
    let flat = match result {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        other => return Err(StoreError::Decode(format!("expected a list, got {other}"))),
    };

    Ok(RankTable::from_entries(flat.chunks(2).map(|pair| {
        RankEntry {
            candidate_id: value_to_id(&pair[0]),
            marks: pair.get(1).map(value_to_marks).unwrap_or(0.0),
        }
    })))
}

#[async_trait]
impl RankStore for KvRestRankStore {
    fn name(&self) -> &str {
        "kv_rest"
    }

    #[instrument(skip(self))]
    async fn load(&self) -> anyhow::Result<RankTable> {
        let result = self.command(&["hgetall", RANKS_KEY]).await?;
        Ok(table_from_flat(result)?)
    }

    #[instrument(skip(self))]
    async fn upsert(&self, candidate_id: &str, marks: f64) -> anyhow::Result<RankTable> {
        let marks = format!("{marks:.6}");
        self.command(&["hset", RANKS_KEY, candidate_id.trim(), &marks])
            .await?;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn load_parses_flat_hash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hgetall/gate_da:ranks"))
            .and(header("Authorization", "Bearer kv-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": ["DA1", "40.500000", "DA2", "72.000000", "DA3"]
            })))
            .mount(&server)
            .await;

        let store = KvRestRankStore::new(&server.uri(), "kv-token").unwrap();
        let table = store.load().await.unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.position_of("DA2"), Some(1));
        assert_eq!(table.position_of("DA3"), Some(3));
    }

    #[tokio::test]
    async fn upsert_encodes_segments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hset/gate_da:ranks/DA%2F7/55.333333"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": 1 })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/hgetall/gate_da:ranks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": ["DA/7", "55.333333"]
            })))
            .mount(&server)
            .await;

        let store = KvRestRankStore::new(&server.uri(), "kv-token").unwrap();
        let table = store.upsert("DA/7", 55.0 + 1.0 / 3.0).await.unwrap();
        assert_eq!(table.position_of("DA/7"), Some(1));
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let store = KvRestRankStore::new(&server.uri(), "bad").unwrap();
        let err = store.load().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Http { status: 401, .. })
        ));
    }

    #[test]
    fn debug_masks_token() {
        let store = KvRestRankStore::new("https://kv.example.com", "secret").unwrap();
        assert!(!format!("{store:?}").contains("secret"));
    }

    #[test]
    fn non_list_result_is_a_decode_error() {
        let err = table_from_flat(serde_json::json!("oops")).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
