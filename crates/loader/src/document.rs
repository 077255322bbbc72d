//! Parsed pipeline document shape (spec §4.9, §6).

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

/// One `{stage_kind: params}` entry within a group's stage list. A plain
/// `HashMap` would do for the single entry a well-formed document carries,
/// but `IndexMap` lets [`crate::loader::PipelineLoader`] report *which* key
/// came first when a document mistakenly carries more than one.
pub type StageEntry = IndexMap<String, serde_json::Value>;

/// The two document encodings spec.md §6 treats as equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// `{ meta: <opaque mapping>, pipeline: { <group>: [ {<stage_kind>:
/// <params>}, ... ], ... } }`, with group and stage order preserved.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDocument {
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
    pub pipeline: IndexMap<String, Vec<StageEntry>>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse pipeline document as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse pipeline document as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PipelineDocument {
    pub fn parse(content: &str, format: Format) -> Result<Self, DocumentError> {
        match format {
            Format::Json => Ok(serde_json::from_str(content)?),
            Format::Yaml => Ok(serde_yaml::from_str(content)?),
        }
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
