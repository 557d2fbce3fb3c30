//! Batch demangling of symbol names.
//!
//! A batch either demangles completely or degrades completely: callers get a
//! [`DemangleOutcome`] holding one name per input, never a partial list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::error::ScanError;
use crate::tools::ToolRunner;

static RE_ITA_MANGLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^_Z[a-zA-Z0-9_]"#).expect("valid itanium mangled regex"));
static RE_MSVC_MANGLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\?\??[A-Za-z0-9_@\$\?]+@@[A-Za-z0-9_@\$\?]+"#).expect("valid msvc mangled regex")
});

/// Attempt to demangle a single symbol in-process. Returns None when not recognized.
pub fn demangle_one(s: &str) -> Option<String> {
    if let Ok(dm) = rustc_demangle::try_demangle(s) {
        return Some(dm.to_string());
    }
    if RE_ITA_MANGLED.is_match(s) {
        if let Ok(sym) = cpp_demangle::Symbol::new(s) {
            return Some(sym.to_string());
        }
    }
    if RE_MSVC_MANGLED.is_match(s) {
        if let Ok(out) = msvc_demangler::demangle(s, msvc_demangler::DemangleFlags::COMPLETE) {
            return Some(out);
        }
    }
    None
}

/// Why a batch fell back to the input names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DegradeReason {
    ToolUnavailable,
    ToolFailed { message: String },
    CountMismatch { expected: usize, actual: usize },
}

/// Result of demangling one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemangleOutcome {
    /// One demangled name per input, in input order.
    Demangled(Vec<String>),
    /// The input names unchanged.
    Degraded {
        names: Vec<String>,
        reason: DegradeReason,
    },
}

/// Serializable summary of a [`DemangleOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DemangleStatus {
    Demangled,
    Degraded {
        #[serde(flatten)]
        reason: DegradeReason,
    },
}

impl DemangleOutcome {
    pub fn into_names(self) -> Vec<String> {
        match self {
            DemangleOutcome::Demangled(names) => names,
            DemangleOutcome::Degraded { names, .. } => names,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, DemangleOutcome::Degraded { .. })
    }

    pub fn status(&self) -> DemangleStatus {
        match self {
            DemangleOutcome::Demangled(_) => DemangleStatus::Demangled,
            DemangleOutcome::Degraded { reason, .. } => DemangleStatus::Degraded {
                reason: reason.clone(),
            },
        }
    }

    fn degraded(names: &[String], reason: DegradeReason) -> Self {
        warn!(count = names.len(), ?reason, "demangling degraded to mangled names");
        DemangleOutcome::Degraded {
            names: names.to_vec(),
            reason,
        }
    }
}

/// Demangles a batch of names.
pub trait Demangler: Send + Sync {
    fn demangle_batch(&self, names: &[String]) -> DemangleOutcome;
}

/// In-process demangling; names that are not recognized pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDemangler;

impl Demangler for BuiltinDemangler {
    fn demangle_batch(&self, names: &[String]) -> DemangleOutcome {
        DemangleOutcome::Demangled(
            names
                .iter()
                .map(|name| demangle_one(name).unwrap_or_else(|| name.clone()))
                .collect(),
        )
    }
}

/// Pipes the batch through an external filter program, one name per line.
pub struct ExternalDemangler {
    runner: Arc<dyn ToolRunner>,
    program: Option<PathBuf>,
}

impl ExternalDemangler {
    /// `program` is `None` when no demangler is installed.
    pub fn new(runner: Arc<dyn ToolRunner>, program: Option<PathBuf>) -> Self {
        Self { runner, program }
    }
}

impl Demangler for ExternalDemangler {
    fn demangle_batch(&self, names: &[String]) -> DemangleOutcome {
        if names.is_empty() {
            return DemangleOutcome::Demangled(Vec::new());
        }
        let Some(program) = &self.program else {
            return DemangleOutcome::degraded(names, DegradeReason::ToolUnavailable);
        };

        let mut input = names.join("\n");
        input.push('\n');
        let program = program.to_string_lossy();
        let output = match self.runner.run(&program, &[], Some(&input)) {
            Ok(output) => output,
            Err(err) if err.is_unavailable() => {
                return DemangleOutcome::degraded(names, DegradeReason::ToolUnavailable)
            }
            Err(err) => {
                return DemangleOutcome::degraded(
                    names,
                    DegradeReason::ToolFailed {
                        message: err.to_string(),
                    },
                )
            }
        };

        let stdout = match output.into_stdout(&program) {
            Ok(stdout) => stdout,
            Err(ScanError::ToolFailed { message, .. }) => {
                return DemangleOutcome::degraded(names, DegradeReason::ToolFailed { message })
            }
            Err(err) => {
                return DemangleOutcome::degraded(
                    names,
                    DegradeReason::ToolFailed {
                        message: err.to_string(),
                    },
                )
            }
        };

        let demangled: Vec<String> = stdout.lines().map(str::to_string).collect();
        if demangled.len() != names.len() {
            return DemangleOutcome::degraded(
                names,
                DegradeReason::CountMismatch {
                    expected: names.len(),
                    actual: demangled.len(),
                },
            );
        }
        DemangleOutcome::Demangled(demangled)
    }
}
