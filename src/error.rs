//! Error types for the wheelscan analysis pipeline.
//!
//! Only conditions that stop an operation are errors. Missing optional
//! capabilities and empty inputs are reported as values by the components
//! themselves (see `kernels::KernelDecode` and `tools::DemangleOutcome`).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wheelscan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// An external tool could not be located or spawned
    #[error("Tool not available: {0}")]
    ToolUnavailable(String),

    /// An external tool ran but reported failure
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// An external tool exceeded its time budget
    #[error("Tool '{tool}' timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// Kernel image records and names disagree in count under strict pairing
    #[error("Kernel table pairing mismatch: {records} records vs {names} names")]
    PairingMismatch { records: usize, names: usize },

    /// Growth threshold string could not be parsed
    #[error("Invalid growth threshold: {0}")]
    InvalidThreshold(String),

    /// Baseline requested for comparison does not exist
    #[error("Baseline file not found: {}", .0.display())]
    BaselineNotFound(PathBuf),

    /// No shared libraries were discovered under the analysis root
    #[error("No shared libraries found under {}", .0.display())]
    NoArtifacts(PathBuf),

    /// Analysis directory holds no size metrics
    #[error("No size data found in {}", .0.display())]
    NoSizeData(PathBuf),

    /// Invalid input data or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Whether the error means a capability is missing rather than broken.
    ///
    /// A timeout is the same class as a missing tool.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ScanError::ToolUnavailable(_) | ScanError::Timeout { .. })
    }

    /// Whether the error aborts a whole run instead of a single artifact.
    pub fn is_fatal_run(&self) -> bool {
        matches!(
            self,
            ScanError::BaselineNotFound(_)
                | ScanError::NoArtifacts(_)
                | ScanError::NoSizeData(_)
                | ScanError::InvalidThreshold(_)
        )
    }
}

/// Result type alias for wheelscan operations
pub type Result<T> = std::result::Result<T, ScanError>;
