//! # Orchestrators
//!
//! The two multi-step workflows the gateway exposes. Both are stateless apart
//! from their platform handle and can be cloned freely into request handlers.

pub mod create;
pub mod enrich;

pub use create::{CreateOutcome, DatasetCreator};
pub use enrich::{DatasetMetrics, DatasetSummary, DayMetrics, MetricsEnricher, UNKNOWN_STATUS};
