//! Test-case catalog loading.
//!
//! Catalogs are JSON files of the form `{"cases": [...]}`, one file per
//! modality. Cases are immutable once loaded; the engine only ever reads
//! them through a shared reference.

use crate::error::GauntletError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which kind of generation a case exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    /// Directory name under the output root for this modality.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
        }
    }

    /// Conventional catalog file name for this modality.
    pub fn catalog_file_name(&self) -> &'static str {
        match self {
            Modality::Text => "text_cases.json",
            Modality::Image => "image_cases.json",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Case difficulty rating from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// One unit of benchmarking work: a prompt plus its expected modality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique case identifier (e.g., "T001")
    pub id: String,

    /// Human-readable case name
    pub name: String,

    /// Grouping category (e.g., "animation", "data-viz")
    #[serde(default = "default_category")]
    pub category: String,

    /// Difficulty rating
    #[serde(default)]
    pub difficulty: Difficulty,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Display icon for the results website
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// The prompt sent to the model
    pub prompt: String,

    /// Modality, assigned from the catalog file the case was loaded from
    #[serde(default = "default_modality")]
    pub modality: Modality,
}

fn default_category() -> String {
    "uncategorized".to_string()
}

fn default_modality() -> Modality {
    Modality::Text
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    cases: Vec<TestCase>,
}

/// Load the catalog for one modality from `dir`.
///
/// A missing catalog file yields an empty battery with a warning; a present
/// but malformed file is an error.
pub fn load_catalog(dir: &Path, modality: Modality) -> Result<Vec<TestCase>, GauntletError> {
    let path = dir.join(modality.catalog_file_name());
    if !path.exists() {
        tracing::warn!("Catalog file not found: {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| GauntletError::Catalog {
        path: path.clone(),
        message: format!("read failed: {e}"),
    })?;
    let file: CatalogFile =
        serde_json::from_str(&content).map_err(|e| GauntletError::Catalog {
            path: path.clone(),
            message: format!("parse failed: {e}"),
        })?;

    let mut cases = file.cases;
    for case in &mut cases {
        case.modality = modality;
    }
    tracing::debug!(
        "Loaded {} {} cases from {}",
        cases.len(),
        modality,
        path.display()
    );
    Ok(cases)
}
