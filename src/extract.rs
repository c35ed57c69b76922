use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Result, ToolError};
use crate::model::Origin;

/// One first-pass metric requirement as produced by an extraction run.
///
/// This is the complete input contract of the consolidation core: only the
/// name is mandatory, and nothing about the entry is trusted to be
/// normalized, categorized, or unique.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMetricEntry {
    #[serde(alias = "raw_name")]
    pub name: String,
    #[serde(default, alias = "raw_description")]
    pub description: Option<String>,
    #[serde(default, alias = "suggested_category")]
    pub category: Option<String>,
}

impl RawMetricEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Boundary to the document-analysis side of the system.
///
/// Implementations wrap whatever locates and extracts candidate metrics from
/// source documents; the pipeline only relies on this output shape. A failed
/// origin is degraded to an empty sequence by the caller, so implementations
/// should error rather than fabricate entries.
pub trait ExtractionAdapter {
    fn extract(&self, origin: Origin) -> Result<Vec<RawMetricEntry>>;
}

/// Adapter reading pre-extracted entries from one JSON file per origin.
///
/// Each file holds a JSON array of `{name, description?, category?}` objects,
/// the shape an upstream extraction agent dumps its first-pass list in.
pub struct JsonExtractionAdapter {
    paths: BTreeMap<Origin, PathBuf>,
}

impl JsonExtractionAdapter {
    pub fn new(regulatory: PathBuf, investor: PathBuf) -> Self {
        let mut paths = BTreeMap::new();
        paths.insert(Origin::Regulatory, regulatory);
        paths.insert(Origin::Investor, investor);
        Self { paths }
    }
}

impl ExtractionAdapter for JsonExtractionAdapter {
    fn extract(&self, origin: Origin) -> Result<Vec<RawMetricEntry>> {
        let path = self
            .paths
            .get(&origin)
            .ok_or_else(|| ToolError::MissingInput(PathBuf::from(origin.label())))?;
        if !path.exists() {
            return Err(ToolError::MissingInput(path.clone()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
