//! # Datadock Core
//!
//! Core library for datadock, a backend-for-frontend in front of a data
//! platform. Provides dataset provisioning (schema inference followed by
//! creation), the metrics-enriched dataset listing, the platform client,
//! configuration, and the HTTP gateway that exposes them.

pub mod config;
pub mod dataset;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod platform;

// Re-export commonly used types at the crate root.
pub use config::{DatadockConfig, MetricsConfig, PlatformConfig, load_config};
pub use dataset::{DatasetContext, FieldRule};
pub use error::{
    ConfigError, DatadockError, DatasetError, PlatformError, Result, ValidationError,
};
pub use gateway::{GatewayConfig, GatewayState, gateway_router, run_gateway};
pub use orchestrator::{CreateOutcome, DatasetCreator, DatasetSummary, MetricsEnricher};
pub use platform::{HttpPlatformClient, MockPlatformApi, PlatformApi};
