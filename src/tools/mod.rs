//! Adapters for the external inspection tools.
//!
//! Every invocation goes through a [`ToolRunner`] so tests can script tool
//! output, and through the timeout wrapper so a hung tool cannot stall a run.

pub mod locate;
pub mod runner;
pub mod sections;

pub use locate::{DemanglerSlot, PathLookup, ToolLookup};
pub use runner::{SystemRunner, ToolOutput, ToolRunner};
pub use sections::{ObjectSectionReader, SectionReader};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{DemanglerBackend, ToolConfig};
use crate::demangle::{BuiltinDemangler, Demangler, ExternalDemangler};
use crate::error::{Result, ScanError};

/// Which symbol table a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTable {
    Dynamic,
    Static,
}

/// The set of collaborators one analysis run talks to.
#[derive(Clone)]
pub struct Toolchain {
    runner: Arc<dyn ToolRunner>,
    lookup: Arc<dyn ToolLookup>,
    slot: Arc<DemanglerSlot>,
    sections: Arc<dyn SectionReader>,
    config: ToolConfig,
}

impl Toolchain {
    /// Real processes, `PATH` lookup and the process-wide demangler slot.
    pub fn system(config: &ToolConfig) -> Self {
        Self::new(
            Arc::new(SystemRunner::new(Duration::from_secs(config.timeout_seconds))),
            Arc::new(PathLookup),
            DemanglerSlot::shared(),
            Arc::new(ObjectSectionReader),
            config.clone(),
        )
    }

    pub fn new(
        runner: Arc<dyn ToolRunner>,
        lookup: Arc<dyn ToolLookup>,
        slot: Arc<DemanglerSlot>,
        sections: Arc<dyn SectionReader>,
        config: ToolConfig,
    ) -> Self {
        Self {
            runner,
            lookup,
            slot,
            sections,
            config,
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    fn run_text(&self, program: &str, args: Vec<String>) -> Result<String> {
        self.runner.run(program, &args, None)?.into_stdout(program)
    }

    /// Wide section header listing of `library`.
    pub fn section_headers(&self, library: &Path) -> Result<String> {
        self.run_text(
            &self.config.readelf,
            vec![
                "--section-headers".to_string(),
                "--wide".to_string(),
                library.display().to_string(),
            ],
        )
    }

    /// POSIX-format symbol listing with decimal sizes, smallest first.
    pub fn symbol_listing(&self, library: &Path, table: SymbolTable, demangle: bool) -> Result<String> {
        let mut args: Vec<String> = ["--size-sort", "--print-size", "--radix=d", "--format=posix"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if table == SymbolTable::Dynamic {
            args.push("-D".to_string());
        }
        if demangle {
            args.push("--demangle".to_string());
        }
        args.push(library.display().to_string());
        self.run_text(&self.config.nm, args)
    }

    /// Dependency listing of `library`.
    pub fn runtime_dependencies(&self, library: &Path) -> Result<String> {
        self.run_text(&self.config.ldd, vec![library.display().to_string()])
    }

    /// ABI audit text for a package archive; `None` when the auditor is not installed.
    pub fn abi_audit(&self, archive: &Path) -> Result<Option<String>> {
        match self.run_text(
            &self.config.auditwheel,
            vec!["show".to_string(), archive.display().to_string()],
        ) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.is_unavailable() => {
                debug!(error = %err, "ABI auditor unavailable");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Raw bytes of one section; `None` when absent or empty.
    pub fn section_bytes(&self, library: &Path, name: &str) -> Result<Option<Vec<u8>>> {
        self.sections.read_section(library, name)
    }

    /// Demangler for the configured backend.
    ///
    /// The external backend resolves its program through the shared slot, so
    /// discovery runs once per slot lifetime.
    pub fn demangler(&self) -> Box<dyn Demangler> {
        match self.config.demangler {
            DemanglerBackend::Builtin => Box::new(BuiltinDemangler),
            DemanglerBackend::External => {
                let program = self
                    .slot
                    .resolve(self.lookup.as_ref(), &self.config.demangler_candidates);
                Box::new(ExternalDemangler::new(Arc::clone(&self.runner), program))
            }
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("config", &self.config)
            .field("demangler_resolved", &self.slot.is_resolved())
            .finish()
    }
}

/// Map an error to the single line recorded for a failed listing.
pub fn failure_line(err: &ScanError) -> String {
    match err {
        ScanError::ToolFailed { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
