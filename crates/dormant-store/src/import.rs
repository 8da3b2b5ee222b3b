use std::path::Path;

use dormant_core::course::{Course, Section};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A catalog document as produced by the catalog scraper:
/// `{ "courses": [...], "sections": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogImport {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Row counts written by one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub courses: usize,
    pub sections: usize,
}

impl CatalogImport {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
