//! Flat size metrics shared by the pipeline and the gate.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, ScanError};

/// Component key to byte count.
pub type MetricsMap = BTreeMap<String, u64>;

/// File name of the metrics document inside an analysis directory.
pub const METRICS_FILE: &str = "metrics.json";

/// Load the current metrics of an analysis directory.
///
/// A missing or empty metrics document is [`ScanError::NoSizeData`].
pub fn load_current_metrics(analysis_dir: &Path) -> Result<MetricsMap> {
    let path = analysis_dir.join(METRICS_FILE);
    if !path.is_file() {
        return Err(ScanError::NoSizeData(analysis_dir.to_path_buf()));
    }
    let metrics: MetricsMap = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    if metrics.is_empty() {
        return Err(ScanError::NoSizeData(analysis_dir.to_path_buf()));
    }
    Ok(metrics)
}
