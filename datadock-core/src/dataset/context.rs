//! Caller-supplied description of a dataset to provision.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

fn default_purpose() -> String {
    "event".to_string()
}

/// An explicit `null` purpose means the default, same as an absent one.
fn purpose_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_purpose))
}

/// Everything the caller tells us about a new dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetContext {
    pub dataset_name: String,
    pub data_location: String,
    /// Normalized with [`validate_type`](super::validate_type); unknown values mean `event`.
    #[serde(default = "default_purpose", deserialize_with = "purpose_or_default")]
    pub dataset_purpose: String,
    #[serde(default)]
    pub dedup_key: Option<String>,
    #[serde(default)]
    pub timestamp_key: Option<String>,
    #[serde(default)]
    pub storage_option: Option<String>,
    #[serde(default)]
    pub pii_fields: Vec<FieldRule>,
    #[serde(default)]
    pub transformation_fields: Vec<FieldRule>,
}

impl DatasetContext {
    /// Minimal context with defaults for everything but name and location.
    pub fn new(dataset_name: impl Into<String>, data_location: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            data_location: data_location.into(),
            dataset_purpose: default_purpose(),
            dedup_key: None,
            timestamp_key: None,
            storage_option: None,
            pii_fields: Vec::new(),
            transformation_fields: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dataset_name.trim().is_empty() {
            return Err(ValidationError::EmptyDatasetName);
        }
        Ok(())
    }
}

/// One entry of `pii_fields` or `transformation_fields`.
///
/// `field` is optional at the wire level so a missing key can be reported
/// with its position instead of as an opaque body error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
}

impl FieldRule {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }
}

/// Decode the `sample_event` of a create request.
///
/// Accepts a JSON object, or a string holding a JSON object. `null`, an
/// absent value, an empty object, and an empty string all mean "no sample".
pub fn decode_sample_event(
    raw: Option<&Value>,
) -> Result<Option<Map<String, Value>>, ValidationError> {
    let event = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s).map_err(|e| {
            ValidationError::SampleEventNotJson {
                message: e.to_string(),
            }
        })?,
        Some(other) => other.clone(),
    };

    match event {
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ValidationError::SampleEventNotObject),
    }
}
