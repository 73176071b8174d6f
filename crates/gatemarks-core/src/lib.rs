//! gatemarks-core — Answer key, marking engine, and evaluation pipeline.
//!
//! This crate defines the exam data model, the pure marking engine, the
//! response-sheet parser, and the async seams that the rest of gatemarks
//! builds on.

pub mod answer_key;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod rank;
pub mod report;
pub mod results;
pub mod sheet;
pub mod statistics;
pub mod traits;
