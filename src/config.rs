//! Configuration for the analysis pipeline.
//!
//! Provides centralized configuration for all components with the defaults
//! the historical size reports were produced with. Every section tolerates
//! missing fields when loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScanError};

/// Master configuration for an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Device kernel table decoding.
    pub kernels: KernelConfig,
    /// Symbol rollups.
    pub symbols: SymbolConfig,
    /// Cross-library overlap.
    pub overlap: OverlapConfig,
    /// External tool invocation.
    pub tools: ToolConfig,
    /// Regression gate.
    pub gate: GateConfig,
}

impl ScanConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ScanConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make rankings meaningless.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("kernels.top_limit", self.kernels.top_limit),
            ("kernels.family_limit", self.kernels.family_limit),
            ("kernels.name_budget", self.kernels.name_budget),
            ("symbols.top_limit", self.symbols.top_limit),
            ("overlap.top_symbols", self.overlap.top_symbols),
            ("overlap.top_namespaces", self.overlap.top_namespaces),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ScanError::InvalidInput(format!("{name} must be > 0")));
            }
        }
        if self.tools.timeout_seconds == 0 {
            return Err(ScanError::InvalidInput(
                "tools.timeout_seconds must be > 0".to_string(),
            ));
        }
        self.gate.threshold()?;
        Ok(())
    }
}

/// Device kernel table configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Number of largest kernels reported (default: 25).
    pub top_limit: usize,
    /// Upper bound on reported families, applied on top of `top_limit` (default: 20).
    pub family_limit: usize,
    /// Characters of a demangled kernel name kept in reports (default: 512).
    pub name_budget: usize,
    /// Fail the decode when record and name counts differ (default: false).
    pub strict_pairing: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            top_limit: 25,
            family_limit: 20,
            name_budget: 512,
            strict_pairing: false,
        }
    }
}

/// Symbol rollup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    /// Capacity of every top-K ranking and namespace rollup of the static table (default: 50).
    pub top_limit: usize,
    /// Namespace entries kept for the dynamic table (default: 50).
    pub dynamic_namespace_limit: usize,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            top_limit: 50,
            dynamic_namespace_limit: 50,
        }
    }
}

/// Cross-library overlap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    /// Shared symbols reported per pair (default: 25).
    pub top_symbols: usize,
    /// Shared namespaces reported per pair (default: 15).
    pub top_namespaces: usize,
    /// Names sampled from the triple intersection (default: 25).
    pub triple_examples: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            top_symbols: 25,
            top_namespaces: 15,
            triple_examples: 25,
        }
    }
}

/// Which demangling backend resolves mangled names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemanglerBackend {
    /// First installed program from `demangler_candidates`, fed one name per line.
    External,
    /// In-process cpp_demangle / rustc-demangle.
    Builtin,
}

/// External tool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Deadline for a single tool invocation (default: 300).
    pub timeout_seconds: u64,
    pub readelf: String,
    pub nm: String,
    pub ldd: String,
    pub auditwheel: String,
    /// Demangler programs probed in order (default: c++filt, llvm-cxxfilt).
    pub demangler_candidates: Vec<String>,
    pub demangler: DemanglerBackend,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: crate::timeout::DEFAULT_TIMEOUT_SECONDS,
            readelf: "readelf".to_string(),
            nm: "nm".to_string(),
            ldd: "ldd".to_string(),
            auditwheel: "auditwheel".to_string(),
            demangler_candidates: vec!["c++filt".to_string(), "llvm-cxxfilt".to_string()],
            demangler: DemanglerBackend::External,
        }
    }
}

/// Regression gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Maximum allowed growth, `N%` or bytes with optional K/M/G suffix (default: 5%).
    pub max_growth: String,
    /// Reductions and listings below this size are not itemized (default: 1 MiB).
    pub report_floor_bytes: u64,
}

impl GateConfig {
    pub fn threshold(&self) -> Result<crate::gate::GrowthThreshold> {
        crate::gate::GrowthThreshold::parse(&self.max_growth)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_growth: "5%".to_string(),
            report_floor_bytes: 1024 * 1024,
        }
    }
}
