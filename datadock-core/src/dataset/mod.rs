//! # Dataset description
//!
//! Pure translation from the caller's dataset description into the pieces of
//! a platform creation request: identifier and type normalization, storage
//! selection, connector wiring, and transformation rules.

pub mod connectors;
pub mod context;
pub mod normalize;
pub mod transformations;

pub use connectors::{
    ConnectorDescriptor, ConnectorSettings, KafkaConnectorConfig, get_connector_config,
};
pub use context::{DatasetContext, FieldRule, decode_sample_event};
pub use normalize::{DatasetType, StorageOption, format_dataset_id, validate_type};
pub use transformations::{
    FunctionType, PiiTreatment, RuleCategory, RuleMode, TransformationFunction,
    TransformationRule, build_transformations,
};
