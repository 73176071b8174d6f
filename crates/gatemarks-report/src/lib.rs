//! gatemarks-report — Report rendering.
//!
//! Turns scored evaluations into a self-contained HTML page and a CSV
//! export of the question-wise breakdown.

pub mod csv;
pub mod html;
