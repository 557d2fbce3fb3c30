//! Size and symbol analysis of the shared libraries shipped in a Python wheel.
//!
//! The external inspection tools (`readelf`, `nm`, `ldd`, `auditwheel`, a
//! demangler) are collaborators reached through [`tools::Toolchain`]; this
//! crate parses their output, decodes the device kernel table, rolls symbols
//! up into bounded summaries, measures cross-library overlap and gates size
//! growth against a stored baseline.

/// Logging and tracing setup
#[macro_use]
pub mod logging;

/// Error types
pub mod error;

/// Timeout wrapper for tool invocations
pub mod timeout;

/// Run configuration
pub mod config;

/// Generic statistics helpers
pub mod stats;

/// Name demangling
pub mod demangle;

/// External tool adapters
pub mod tools;

/// Parsers for tool output
pub mod parse;

/// Section aggregates and device sections
pub mod sections;

/// Device kernel table decoding
pub mod kernels;

/// Symbol classification and rollups
pub mod symbols;

/// Cross-library symbol overlap
pub mod overlap;

/// File inventory of an extracted package
pub mod inventory;

/// Size regression gate
pub mod gate;

/// Run orchestration and report output
pub mod pipeline;

pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use gate::{evaluate, GateOutcome, GrowthThreshold, MetricsMap};
pub use kernels::{decode_kernel_table, KernelDecode, KernelSummary};
pub use overlap::{compute_overlap, OverlapReport};
pub use pipeline::{analyze_library, analyze_run, flatten_metrics, write_outputs, LibraryOutcome, RunReport};
pub use tools::Toolchain;
