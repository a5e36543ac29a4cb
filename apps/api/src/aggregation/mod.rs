//! Aggregation pipeline: collect → dedupe → score → rank.
//!
//! Provider and scoring failures are absorbed along the way; only an invalid
//! request surfaces as an error.

pub mod collector;
pub mod dedup;
pub mod handlers;
pub mod pipeline;
pub mod ranking;

pub use pipeline::{AggregationResult, Aggregator};
