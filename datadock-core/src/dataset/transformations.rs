//! Builds the transformation rule list from PII and transformation field entries.

use serde::{Deserialize, Serialize};

use super::context::FieldRule;
use crate::error::ValidationError;

/// How a PII field is protected before storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PiiTreatment {
    #[default]
    Mask,
    Encrypt,
}

impl PiiTreatment {
    pub fn parse(value: Option<&str>) -> Result<Self, ValidationError> {
        let Some(raw) = value else {
            return Ok(PiiTreatment::Mask);
        };
        match raw.trim().to_lowercase().as_str() {
            "mask" => Ok(PiiTreatment::Mask),
            "encrypt" => Ok(PiiTreatment::Encrypt),
            _ => Err(ValidationError::UnknownTreatment {
                value: raw.to_string(),
            }),
        }
    }

    fn function_type(self) -> FunctionType {
        match self {
            PiiTreatment::Mask => FunctionType::Mask,
            PiiTreatment::Encrypt => FunctionType::Encrypt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionType {
    Mask,
    Encrypt,
    Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Pii,
    Transformation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleMode {
    #[default]
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationFunction {
    #[serde(rename = "type")]
    pub kind: FunctionType,
    pub expr: String,
    pub category: RuleCategory,
}

/// One entry of the creation request's `transformations_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    pub field_key: String,
    pub transformation_function: TransformationFunction,
    pub mode: RuleMode,
}

/// Map PII entries then transformation entries into a single ordered rule list.
///
/// PII rules use the field name as their expression. Transformation rules use
/// `expr`, or an empty string when absent. An entry without a usable `field`
/// rejects the whole list.
pub fn build_transformations(
    pii_fields: &[FieldRule],
    transformation_fields: &[FieldRule],
) -> Result<Vec<TransformationRule>, ValidationError> {
    let mut rules = Vec::with_capacity(pii_fields.len() + transformation_fields.len());

    for (index, entry) in pii_fields.iter().enumerate() {
        let field = required_field(entry, "pii_fields", index)?;
        let treatment = PiiTreatment::parse(entry.treatment.as_deref())?;
        rules.push(TransformationRule {
            field_key: field.to_string(),
            transformation_function: TransformationFunction {
                kind: treatment.function_type(),
                expr: field.to_string(),
                category: RuleCategory::Pii,
            },
            mode: RuleMode::Strict,
        });
    }

    for (index, entry) in transformation_fields.iter().enumerate() {
        let field = required_field(entry, "transformation_fields", index)?;
        rules.push(TransformationRule {
            field_key: field.to_string(),
            transformation_function: TransformationFunction {
                kind: FunctionType::Transform,
                expr: entry.expr.clone().unwrap_or_default(),
                category: RuleCategory::Transformation,
            },
            mode: RuleMode::Strict,
        });
    }

    Ok(rules)
}

fn required_field<'a>(
    entry: &'a FieldRule,
    list: &'static str,
    index: usize,
) -> Result<&'a str, ValidationError> {
    match entry.field.as_deref() {
        Some(f) if !f.trim().is_empty() => Ok(f),
        _ => Err(ValidationError::MissingField { list, index }),
    }
}
