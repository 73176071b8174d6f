//! Configuration loading and collaborator factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gatemarks_core::pipeline::EvaluatorConfig;
use gatemarks_core::traits::{RankStore, SheetSource};

use crate::fetch::{AutoSheetSource, HttpSheetSource};
use crate::kv_rest::KvRestRankStore;
use crate::memory::MemoryRankStore;
use crate::redis::RedisRankStore;

/// Where candidate totals are kept.
///
/// Note: Custom Debug impl masks the KV token to prevent accidental exposure in logs.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local table; ranks last for one run only.
    #[default]
    Memory,
    Redis {
        url: String,
    },
    KvRest {
        url: String,
        token: String,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory => f.debug_struct("Memory").finish(),
            StoreConfig::Redis { url } => f.debug_struct("Redis").field("url", url).finish(),
            StoreConfig::KvRest { url, token: _ } => f
                .debug_struct("KvRest")
                .field("url", url)
                .field("token", &"***")
                .finish(),
        }
    }
}

/// HTTP settings for fetching response sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Retry without certificate verification when the portal's chain fails.
    #[serde(default = "default_true")]
    pub insecure_fallback: bool,
}

fn default_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X) AppleWebKit/537.36 (KHTML, like Gecko) Chrome Safari"
        .to_string()
}
fn default_true() -> bool {
    true
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            insecure_fallback: true,
        }
    }
}

/// Top-level gatemarks configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatemarksConfig {
    /// Answer key file (TOML or text rendering).
    #[serde(default)]
    pub answer_key: Option<PathBuf>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Max sheets evaluated at once.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Retries on transient fetch errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./gatemarks-results")
}

impl Default for GatemarksConfig {
    fn default() -> Self {
        Self {
            answer_key: None,
            fetch: FetchConfig::default(),
            store: StoreConfig::default(),
            parallelism: default_parallelism(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_output_dir(),
        }
    }
}

impl GatemarksConfig {
    /// Pipeline settings derived from this configuration.
    pub fn evaluator_config(&self, record_ranks: bool) -> EvaluatorConfig {
        EvaluatorConfig {
            parallelism: self.parallelism,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            record_ranks,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Memory => StoreConfig::Memory,
        StoreConfig::Redis { url } => StoreConfig::Redis {
            url: resolve_env_vars(url),
        },
        StoreConfig::KvRest { url, token } => StoreConfig::KvRest {
            url: resolve_env_vars(url),
            token: resolve_env_vars(token),
        },
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gatemarks.toml` in the current directory
/// 2. `~/.config/gatemarks/config.toml`
///
/// Environment variable overrides: `GATEMARKS_ANSWER_KEY`, `REDIS_URL`,
/// and `KV_REST_API_URL` with `KV_REST_API_TOKEN`. Redis wins when both
/// stores are configured.
pub fn load_config() -> Result<GatemarksConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GatemarksConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gatemarks.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<GatemarksConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GatemarksConfig::default(),
    };

    // Apply env var overrides
    if let Some(key) = non_empty_env("GATEMARKS_ANSWER_KEY") {
        config.answer_key = Some(PathBuf::from(key));
    }

    if let Some(url) = non_empty_env("REDIS_URL") {
        config.store = StoreConfig::Redis { url };
    } else if let (Some(url), Some(token)) = (
        non_empty_env("KV_REST_API_URL"),
        non_empty_env("KV_REST_API_TOKEN"),
    ) {
        config.store = StoreConfig::KvRest { url, token };
    }

    config.store = resolve_store_config(&config.store);
    if let Some(key) = &config.answer_key {
        config.answer_key = Some(PathBuf::from(resolve_env_vars(&key.to_string_lossy())));
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gatemarks"))
}

/// Create a rank store from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn RankStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryRankStore::new())),
        StoreConfig::Redis { url } => Ok(Arc::new(RedisRankStore::new(url)?)),
        StoreConfig::KvRest { url, token } => Ok(Arc::new(KvRestRankStore::new(url, token)?)),
    }
}

/// Create the sheet source used for `--sheet` locations.
pub fn create_source(config: &FetchConfig) -> Result<Arc<dyn SheetSource>> {
    let http = HttpSheetSource::new(config)?;
    Ok(Arc::new(AutoSheetSource::new(http)))
}
