//! Per-library analysis and run orchestration.
//!
//! Libraries are analyzed independently on the rayon pool. A library whose
//! section or symbol listing fails becomes a [`LibraryOutcome::Failed`] entry
//! and the rest of the run proceeds; results keep discovery order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::demangle::{DemangleStatus, Demangler};
use crate::error::{Result, ScanError};
use crate::gate::{MetricsMap, METRICS_FILE};
use crate::inventory::{build_inventory, has_shared_object_suffix, FileInventory};
use crate::kernels::KernelDecode;
use crate::overlap::{compute_overlap, OverlapReport};
use crate::parse::{
    parse_abi_report, parse_dependency_lines, parse_section_headers, parse_symbol_listing,
    AbiReport, NameLayout,
};
use crate::sections::{summarize_sections, SectionSummary, IMAGE_TABLE_SECTION, KERNEL_SYMBOL_SECTION};
use crate::symbols::{
    resolve_symbols, summarize_dynamic, summarize_static, DynamicSymbolSummary, ResolvedSymbols,
    StaticSymbolSummary,
};
use crate::tools::{failure_line, SymbolTable, Toolchain};

/// Everything measured for one shared library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryReport {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub sections: SectionSummary,
    /// Present only when the library carries device images.
    pub device_kernels: Option<KernelDecode>,
    pub dynamic_symbols: DynamicSymbolSummary,
    pub dynamic_demangling: DemangleStatus,
    pub static_symbols: StaticSymbolSummary,
    pub static_demangling: DemangleStatus,
    pub runtime_dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LibraryOutcome {
    Analyzed(Box<LibraryReport>),
    Failed {
        name: String,
        path: String,
        error: String,
    },
}

impl LibraryOutcome {
    pub fn name(&self) -> &str {
        match self {
            LibraryOutcome::Analyzed(report) => &report.name,
            LibraryOutcome::Failed { name, .. } => name,
        }
    }

    pub fn report(&self) -> Option<&LibraryReport> {
        match self {
            LibraryOutcome::Analyzed(report) => Some(report),
            LibraryOutcome::Failed { .. } => None,
        }
    }
}

/// Result of analyzing one extracted package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub libraries: Vec<LibraryOutcome>,
    pub overlap: OverlapReport,
    pub abi: Option<AbiReport>,
    pub inventory: Option<FileInventory>,
}

impl RunReport {
    pub fn analyzed(&self) -> impl Iterator<Item = &LibraryReport> {
        self.libraries.iter().filter_map(LibraryOutcome::report)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Shared libraries under `root`, in path order.
pub fn discover_libraries(root: &Path) -> Result<Vec<PathBuf>> {
    let libraries: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_shared_object_suffix(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();
    if libraries.is_empty() {
        return Err(ScanError::NoArtifacts(root.to_path_buf()));
    }
    debug!(count = libraries.len(), root = %root.display(), "discovered shared libraries");
    Ok(libraries)
}

/// Read and resolve one symbol table.
///
/// The mangled listing is required; the demangled listing is best effort.
pub fn load_symbols(
    tools: &Toolchain,
    library: &Path,
    table: SymbolTable,
    demangler: &dyn Demangler,
) -> Result<ResolvedSymbols> {
    let mangled = parse_symbol_listing(
        &tools.symbol_listing(library, table, false)?,
        NameLayout::Mangled,
    );
    let demangled = match tools.symbol_listing(library, table, true) {
        Ok(text) => Some(parse_symbol_listing(&text, NameLayout::Demangled)),
        Err(err) => {
            debug!(library = %library.display(), error = %err, "demangled listing unavailable");
            None
        }
    };
    Ok(resolve_symbols(mangled, demangled, demangler))
}

pub fn analyze_library(tools: &Toolchain, library: &Path, config: &ScanConfig) -> Result<LibraryReport> {
    let name = file_name(library);
    let span = crate::span_trace!("analyze_library", library = %name);
    let _guard = span.enter();

    let size_bytes = std::fs::metadata(library)?.len();
    let sections = summarize_sections(parse_section_headers(&tools.section_headers(library)?));
    let demangler = tools.demangler();

    let device_kernels = sections.has_device_images().then(|| {
        KernelDecode::from_sections(
            tools.section_bytes(library, IMAGE_TABLE_SECTION),
            tools.section_bytes(library, KERNEL_SYMBOL_SECTION),
            demangler.as_ref(),
            &config.kernels,
        )
    });

    let dynamic = load_symbols(tools, library, SymbolTable::Dynamic, demangler.as_ref())?;
    let static_table = load_symbols(tools, library, SymbolTable::Static, demangler.as_ref())?;

    let runtime_dependencies = match tools.runtime_dependencies(library) {
        Ok(text) => parse_dependency_lines(&text),
        Err(err) => {
            warn!(library = %name, error = %err, "dependency listing failed");
            vec![failure_line(&err)]
        }
    };

    info!(
        library = %name,
        size_bytes,
        dynamic_symbols = dynamic.records.len(),
        static_symbols = static_table.records.len(),
        "library analyzed"
    );
    Ok(LibraryReport {
        path: library.display().to_string(),
        name,
        size_bytes,
        sections,
        device_kernels,
        dynamic_symbols: summarize_dynamic(&dynamic.records, config.symbols.dynamic_namespace_limit),
        dynamic_demangling: dynamic.demangling,
        static_symbols: summarize_static(&static_table.records, config.symbols.top_limit),
        static_demangling: static_table.demangling,
        runtime_dependencies,
    })
}

/// Analyze every shared library under `root`.
///
/// `archive` is the package file the tree was extracted from; it feeds the
/// ABI audit and the compressed size metric.
pub fn analyze_run(
    tools: &Toolchain,
    root: &Path,
    archive: Option<&Path>,
    config: &ScanConfig,
) -> Result<RunReport> {
    let span = crate::span_trace!("analyze_run", root = %root.display());
    let _guard = span.enter();

    let libraries = discover_libraries(root)?;
    let inventory = build_inventory(root, archive)?;

    // Worker threads do not inherit the caller's span.
    let outcomes: Vec<LibraryOutcome> = libraries
        .par_iter()
        .map(|path| {
            span.in_scope(|| match analyze_library(tools, path, config) {
                Ok(report) => LibraryOutcome::Analyzed(Box::new(report)),
                Err(err) => {
                    error!(library = %path.display(), error = %err, "library analysis failed");
                    LibraryOutcome::Failed {
                        name: file_name(path),
                        path: path.display().to_string(),
                        error: err.to_string(),
                    }
                }
            })
        })
        .collect();

    let symbol_maps: Vec<(String, _)> = outcomes
        .iter()
        .filter_map(LibraryOutcome::report)
        .map(|r| (r.name.clone(), r.dynamic_symbols.size_map()))
        .collect();
    let overlap = compute_overlap(&symbol_maps, &config.overlap);

    let abi = match archive {
        Some(archive) => match tools.abi_audit(archive) {
            Ok(text) => text.as_deref().map(parse_abi_report),
            Err(err) => {
                warn!(archive = %archive.display(), error = %err, "ABI audit failed");
                None
            }
        },
        None => None,
    };

    let failed = outcomes.iter().filter(|o| o.report().is_none()).count();
    info!(libraries = outcomes.len(), failed, "run analyzed");
    Ok(RunReport {
        libraries: outcomes,
        overlap,
        abi,
        inventory: Some(inventory),
    })
}

/// Flatten a run into the component sizes the regression gate compares.
pub fn flatten_metrics(report: &RunReport) -> MetricsMap {
    let mut metrics = MetricsMap::new();
    if let Some(inventory) = &report.inventory {
        if let Some(archive_size) = inventory.archive_size_bytes {
            metrics.insert("wheel_compressed".to_string(), archive_size);
        }
        metrics.insert(
            "wheel_uncompressed".to_string(),
            inventory.total_uncompressed_bytes,
        );
    }
    for library in report.analyzed() {
        if library.size_bytes > 0 {
            metrics.insert(format!("library_{}", library.name), library.size_bytes);
        }
        let device_total = library.sections.device_overview.total_bytes;
        if device_total > 0 {
            metrics.insert(format!("device_{}", library.name), device_total);
        }
        for (aggregate, size) in library.sections.aggregates.entries() {
            metrics.insert(format!("section_{}_{}", library.name, aggregate), size);
        }
    }
    metrics
}

#[derive(Serialize)]
struct LibraryDocument<'a, T: Serialize> {
    library: &'a str,
    path: &'a str,
    #[serde(flatten)]
    body: &'a T,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    debug!(path = %path.display(), "wrote report");
    Ok(())
}

/// Write the JSON artifacts of a run into `output_dir`.
pub fn write_outputs(report: &RunReport, output_dir: &Path) -> Result<MetricsMap> {
    std::fs::create_dir_all(output_dir)?;

    let mut sections = BTreeMap::new();
    let mut dynamic = BTreeMap::new();
    let mut static_tables = BTreeMap::new();
    let mut dependencies = BTreeMap::new();

    for library in report.analyzed() {
        write_json(
            &output_dir.join(format!("sections_{}.json", library.name)),
            &LibraryDocument {
                library: &library.name,
                path: &library.path,
                body: &library.sections,
            },
        )?;
        if let Some(KernelDecode::Decoded(summary)) = &library.device_kernels {
            write_json(
                &output_dir.join(format!("device_kernels_{}.json", library.name)),
                summary,
            )?;
        }
        write_json(
            &output_dir.join(format!("symbols_{}.json", library.name)),
            &LibraryDocument {
                library: &library.name,
                path: &library.path,
                body: &library.dynamic_symbols,
            },
        )?;
        write_json(
            &output_dir.join(format!("static_symbols_{}.json", library.name)),
            &LibraryDocument {
                library: &library.name,
                path: &library.path,
                body: &library.static_symbols,
            },
        )?;

        sections.insert(library.name.as_str(), &library.sections);
        dynamic.insert(library.name.as_str(), &library.dynamic_symbols);
        static_tables.insert(library.name.as_str(), &library.static_symbols);
        dependencies.insert(library.name.as_str(), &library.runtime_dependencies);
    }

    write_json(&output_dir.join("sections_summary.json"), &sections)?;
    write_json(&output_dir.join("symbols_summary.json"), &dynamic)?;
    write_json(&output_dir.join("static_symbols_summary.json"), &static_tables)?;
    write_json(&output_dir.join("runtime_dependencies.json"), &dependencies)?;
    write_json(&output_dir.join("symbol_overlap.json"), &report.overlap)?;
    write_json(&output_dir.join("libraries.json"), &report.libraries)?;
    if let Some(abi) = &report.abi {
        write_json(&output_dir.join("auditwheel_report.json"), abi)?;
    }
    if let Some(inventory) = &report.inventory {
        write_json(&output_dir.join("file_inventory.json"), inventory)?;
    }

    let metrics = flatten_metrics(report);
    write_json(&output_dir.join(METRICS_FILE), &metrics)?;
    info!(output = %output_dir.display(), components = metrics.len(), "analysis written");
    Ok(metrics)
}
