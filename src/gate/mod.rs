//! Size regression gate.
//!
//! Compares the current [`MetricsMap`] against a stored baseline. Components
//! missing from the baseline are new, never failures; components only in the
//! baseline are ignored. The verdict does not depend on iteration order.

pub mod baseline;
pub mod metrics;
pub mod threshold;

pub use baseline::{load_baseline, save_baseline, BaselineDocument, BaselineMetadata};
pub use metrics::{load_current_metrics, MetricsMap, METRICS_FILE};
pub use threshold::GrowthThreshold;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::GateConfig;
use crate::error::Result;

/// A component that grew past the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateFailure {
    pub component: String,
    pub baseline: u64,
    pub current: u64,
    pub growth: u64,
    /// Growth in percent of the baseline; absent for a zero baseline.
    pub growth_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComponent {
    pub component: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Improvement {
    pub component: String,
    pub reduction: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub passed: bool,
    /// Largest growth first.
    pub failures: Vec<GateFailure>,
    pub new_components: Vec<NewComponent>,
    /// Reductions above the report floor, largest first.
    pub improvements: Vec<Improvement>,
}

/// Full comparison document written next to the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    pub threshold: String,
    #[serde(flatten)]
    pub outcome: GateOutcome,
    pub current_sizes: MetricsMap,
    pub baseline_sizes: MetricsMap,
}

pub fn evaluate(
    current: &MetricsMap,
    baseline: &MetricsMap,
    threshold: &GrowthThreshold,
    report_floor: u64,
) -> GateOutcome {
    let mut failures = Vec::new();
    let mut new_components = Vec::new();
    let mut improvements = Vec::new();

    for (component, &current_size) in current {
        let Some(&baseline_size) = baseline.get(component) else {
            info!(component = %component, size = current_size, "new component");
            new_components.push(NewComponent {
                component: component.clone(),
                size: current_size,
            });
            continue;
        };

        if current_size <= baseline_size {
            let reduction = baseline_size - current_size;
            if reduction > report_floor {
                improvements.push(Improvement {
                    component: component.clone(),
                    reduction,
                });
            }
            continue;
        }

        let growth = current_size - baseline_size;
        if threshold.is_exceeded(baseline_size, growth) {
            let growth_pct =
                (baseline_size > 0).then(|| growth as f64 * 100.0 / baseline_size as f64);
            warn!(component = %component, baseline = baseline_size, current = current_size, "size regression");
            failures.push(GateFailure {
                component: component.clone(),
                baseline: baseline_size,
                current: current_size,
                growth,
                growth_pct,
            });
        }
    }

    failures.sort_by(|a, b| b.growth.cmp(&a.growth));
    improvements.sort_by(|a, b| b.reduction.cmp(&a.reduction));

    GateOutcome {
        passed: failures.is_empty(),
        failures,
        new_components,
        improvements,
    }
}

/// [`evaluate`] with the threshold and report floor of `config`.
pub fn evaluate_with_config(
    current: &MetricsMap,
    baseline: &MetricsMap,
    config: &GateConfig,
) -> Result<GateOutcome> {
    let threshold = config.threshold()?;
    Ok(evaluate(current, baseline, &threshold, config.report_floor_bytes))
}

/// Components of `current` above `floor`, in key order.
pub fn components_above(current: &MetricsMap, floor: u64) -> Vec<(&str, u64)> {
    current
        .iter()
        .filter(|&(_, &size)| size > floor)
        .map(|(name, &size)| (name.as_str(), size))
        .collect()
}

/// Human-readable byte count with binary units.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KiB", "MiB", "GiB"] {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} TiB")
}
