//! gatemarks-remote — Sheet sources, rank stores, and configuration.
//!
//! Implements the `SheetSource` and `RankStore` traits from
//! `gatemarks-core` over HTTP, local files, Redis, and a KV REST API.

pub mod config;
pub mod fetch;
pub mod kv_rest;
pub mod memory;
pub mod redis;

pub use config::{create_source, create_store, load_config, GatemarksConfig, StoreConfig};
pub use fetch::{AutoSheetSource, FileSheetSource, HttpSheetSource};
pub use kv_rest::KvRestRankStore;
pub use memory::MemoryRankStore;
pub use self::redis::RedisRankStore;

/// Hash holding candidate totals, shared by the Redis and KV REST stores.
pub const RANKS_KEY: &str = "gate_da:ranks";
