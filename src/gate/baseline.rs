//! Baseline persistence.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::metrics::MetricsMap;
use crate::error::{Result, ScanError};

pub const BASELINE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineMetadata {
    pub component_count: u64,
    pub total_size: u64,
}

/// Versioned baseline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineDocument {
    #[serde(default = "default_version")]
    pub format_version: u32,
    pub sizes: MetricsMap,
    #[serde(default)]
    pub metadata: BaselineMetadata,
}

fn default_version() -> u32 {
    BASELINE_FORMAT_VERSION
}

impl BaselineDocument {
    pub fn new(sizes: MetricsMap) -> Self {
        let metadata = BaselineMetadata {
            component_count: sizes.len() as u64,
            total_size: sizes.values().fold(0, |sum: u64, &size| sum.saturating_add(size)),
        };
        Self {
            format_version: BASELINE_FORMAT_VERSION,
            sizes,
            metadata,
        }
    }
}

/// Either the versioned document or a bare component map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BaselineFile {
    Versioned(BaselineDocument),
    Flat(MetricsMap),
}

/// Write `sizes` as a versioned baseline.
pub fn save_baseline(sizes: &MetricsMap, path: &Path) -> Result<BaselineDocument> {
    let document = BaselineDocument::new(sizes.clone());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
    info!(path = %path.display(), components = document.metadata.component_count, "baseline saved");
    Ok(document)
}

/// Read the component sizes of a baseline file.
pub fn load_baseline(path: &Path) -> Result<MetricsMap> {
    if !path.is_file() {
        return Err(ScanError::BaselineNotFound(path.to_path_buf()));
    }
    let file: BaselineFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(match file {
        BaselineFile::Versioned(document) => document.sizes,
        BaselineFile::Flat(sizes) => sizes,
    })
}
