//! Identifier, dataset type, and storage option normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Derive a platform dataset identifier from a display name.
///
/// Every character maps to exactly one output character: the lowercase form
/// when it lands in `[a-z0-9.-]`, otherwise `-`. Runs are not collapsed, so
/// the output has the same number of characters as the input.
pub fn format_dataset_id(name: &str) -> String {
    name.chars().map(normalize_id_char).collect()
}

fn normalize_id_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) if is_id_char(l) => l,
        _ => '-',
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

/// The kind of data stream a dataset carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    #[default]
    Event,
    Transaction,
    Master,
}

impl DatasetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetType::Event => "event",
            DatasetType::Transaction => "transaction",
            DatasetType::Master => "master",
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a caller-supplied dataset purpose.
///
/// Matching is case-insensitive. Unrecognized values silently fall back to
/// [`DatasetType::Event`]; this never rejects.
pub fn validate_type(purpose: &str) -> DatasetType {
    match purpose.to_lowercase().as_str() {
        "transaction" => DatasetType::Transaction,
        "master" => DatasetType::Master,
        _ => DatasetType::Event,
    }
}

/// Where a dataset's events are indexed.
///
/// Accepted spellings (case-insensitive, surrounding whitespace ignored):
///
/// | Variant | Values |
/// |---|---|
/// | `Olap` | `druid`, `apache druid` |
/// | `Lakehouse` | `lakehouse`, `hudi`, `apache hudi` |
///
/// An absent option means `Olap`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageOption {
    #[default]
    Olap,
    Lakehouse,
}

impl StorageOption {
    pub fn parse(value: Option<&str>) -> Result<Self, ValidationError> {
        let Some(raw) = value else {
            return Ok(StorageOption::Olap);
        };
        match raw.trim().to_lowercase().as_str() {
            "druid" | "apache druid" => Ok(StorageOption::Olap),
            "lakehouse" | "hudi" | "apache hudi" => Ok(StorageOption::Lakehouse),
            _ => Err(ValidationError::UnknownStorageOption {
                value: raw.to_string(),
            }),
        }
    }

    pub fn olap_store_enabled(&self) -> bool {
        matches!(self, StorageOption::Olap)
    }

    pub fn lakehouse_enabled(&self) -> bool {
        matches!(self, StorageOption::Lakehouse)
    }
}
