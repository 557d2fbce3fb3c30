//! Device kernel table decoding.
//!
//! Libraries built with device offloading carry a `.tgtimg` section of
//! offset/size records and a `.tgtsym` section of kernel names. This module
//! pairs them, classifies every kernel into a namespace family and reports
//! size distributions.

pub mod family;
pub mod table;

pub use family::{classify_family, kernel_identifier, OTHER_FAMILY};
pub use table::{
    decode_image_records, decode_kernel_names, ImageRecord, KernelPairing, PairingReport,
    RECORD_SIZE,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::KernelConfig;
use crate::demangle::{DemangleStatus, Demangler};
use crate::error::{Result, ScanError};
use crate::stats::{fixed_bucket_histogram, interpolated_percentile, HistogramBucket, Tally};

const KIB: u64 = 1024;

/// Inclusive upper bounds of the kernel size histogram.
pub const SIZE_BUCKETS: &[(u64, &str)] = &[
    (KIB / 2, "≤0.5 KiB"),
    (KIB, "≤1 KiB"),
    (2 * KIB, "≤2 KiB"),
    (4 * KIB, "≤4 KiB"),
    (8 * KIB, "≤8 KiB"),
    (16 * KIB, "≤16 KiB"),
    (32 * KIB, "≤32 KiB"),
    (64 * KIB, "≤64 KiB"),
    (128 * KIB, "≤128 KiB"),
    (256 * KIB, "≤256 KiB"),
    (512 * KIB, "≤512 KiB"),
];

pub const OVERFLOW_BUCKET: &str = ">512 KiB";

/// One paired kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelEntry {
    pub offset: u64,
    pub size: u64,
    /// Name as stored in the symbol table.
    pub mangled: String,
    pub demangled: String,
    pub family: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStats {
    pub min: u64,
    pub median: u64,
    pub p90: u64,
    pub p99: u64,
    pub max: u64,
}

impl SizeStats {
    /// `sorted` must be ascending and non-empty.
    fn from_sorted(sorted: &[u64]) -> Option<Self> {
        let percentile = |p| interpolated_percentile(sorted, p).map(|v| v as u64);
        Some(Self {
            min: *sorted.first()?,
            median: percentile(0.5)?,
            p90: percentile(0.9)?,
            p99: percentile(0.99)?,
            max: *sorted.last()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyStat {
    pub family: String,
    pub bytes: u64,
    pub count: u64,
}

#[derive(Debug, Default)]
struct FamilyTotals {
    bytes: u64,
    count: u64,
}

/// Decoded kernel table of one library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSummary {
    pub entry_count: u64,
    pub total_bytes: u64,
    pub average_bytes: f64,
    /// Non-zero records before pairing.
    pub raw_entry_count: u64,
    /// Names before pairing.
    pub raw_name_count: u64,
    pub size_stats: SizeStats,
    pub size_histogram: Vec<HistogramBucket>,
    pub top_families: Vec<FamilyStat>,
    pub top_kernels: Vec<KernelEntry>,
    pub demangling: DemangleStatus,
    pub pairing: PairingReport,
}

/// Outcome of decoding one library's kernel table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KernelDecode {
    Decoded(KernelSummary),
    /// The sections could not be read with the available capabilities.
    Unavailable { reason: String },
    /// A section is absent or empty, or nothing pairs up.
    NoData,
    Failed { error: String },
}

impl KernelDecode {
    /// Decode from section reads, mapping read errors onto outcome variants.
    pub fn from_sections(
        image: Result<Option<Vec<u8>>>,
        symbols: Result<Option<Vec<u8>>>,
        demangler: &dyn Demangler,
        config: &KernelConfig,
    ) -> Self {
        let buffers = image.and_then(|image| Ok((image, symbols?)));
        let (image, symbols) = match buffers {
            Ok((Some(image), Some(symbols))) => (image, symbols),
            Ok(_) => return KernelDecode::NoData,
            Err(err) => return Self::from_error(err),
        };
        match decode_kernel_table(&image, &symbols, demangler, config) {
            Ok(Some(summary)) => KernelDecode::Decoded(summary),
            Ok(None) => KernelDecode::NoData,
            Err(err) => Self::from_error(err),
        }
    }

    fn from_error(err: ScanError) -> Self {
        if err.is_unavailable() {
            debug!(error = %err, "kernel table decoding unavailable");
            KernelDecode::Unavailable {
                reason: err.to_string(),
            }
        } else {
            warn!(error = %err, "kernel table decoding failed");
            KernelDecode::Failed {
                error: err.to_string(),
            }
        }
    }

    pub fn summary(&self) -> Option<&KernelSummary> {
        match self {
            KernelDecode::Decoded(summary) => Some(summary),
            _ => None,
        }
    }
}

fn truncate_name(name: &str, budget: usize) -> String {
    match name.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}…", &name[..cut]),
        None => name.to_string(),
    }
}

/// Decode a kernel table from its two raw buffers.
///
/// Returns `Ok(None)` when no record pairs with a name. Under
/// `strict_pairing` a count mismatch is [`ScanError::PairingMismatch`].
pub fn decode_kernel_table(
    image: &[u8],
    symbols: &[u8],
    demangler: &dyn Demangler,
    config: &KernelConfig,
) -> Result<Option<KernelSummary>> {
    let records = decode_image_records(image);
    let names = decode_kernel_names(symbols);
    let raw_entry_count = records.len() as u64;
    let raw_name_count = names.len() as u64;

    let pairing = KernelPairing::pair(records, names);
    if config.strict_pairing && pairing.is_mismatched() {
        return Err(ScanError::PairingMismatch {
            records: raw_entry_count as usize,
            names: raw_name_count as usize,
        });
    }
    if pairing.pairs.is_empty() {
        return Ok(None);
    }
    let pairing_report = pairing.report();

    let identifiers: Vec<String> = pairing
        .pairs
        .iter()
        .map(|(_, name)| kernel_identifier(name).to_string())
        .collect();
    let outcome = demangler.demangle_batch(&identifiers);
    let demangling = outcome.status();

    let mut families: Tally<FamilyTotals> = Tally::new();
    let mut entries = Vec::with_capacity(pairing.pairs.len());
    let mut sizes = Vec::with_capacity(pairing.pairs.len());

    for ((record, mangled), demangled) in pairing.pairs.into_iter().zip(outcome.into_names()) {
        let family = classify_family(&demangled);
        let totals = families.entry(&family);
        totals.bytes = totals.bytes.saturating_add(record.size);
        totals.count += 1;
        sizes.push(record.size);
        entries.push(KernelEntry {
            offset: record.offset,
            size: record.size,
            mangled,
            demangled,
            family,
        });
    }

    let size_histogram = fixed_bucket_histogram(sizes.iter().copied(), SIZE_BUCKETS, OVERFLOW_BUCKET);
    sizes.sort_unstable();
    let entry_count = sizes.len() as u64;
    let total_bytes = sizes.iter().fold(0u64, |sum, &size| sum.saturating_add(size));
    let size_stats = SizeStats::from_sorted(&sizes).unwrap_or_default();

    let top_families = families
        .ranked_by(|f| f.bytes, config.top_limit.min(config.family_limit))
        .into_iter()
        .map(|(family, totals)| FamilyStat {
            family,
            bytes: totals.bytes,
            count: totals.count,
        })
        .collect();

    // Stable: equal sizes stay in table order.
    entries.sort_by(|a, b| b.size.cmp(&a.size));
    entries.truncate(config.top_limit);
    let top_kernels = entries
        .into_iter()
        .map(|mut entry| {
            entry.demangled = truncate_name(&entry.demangled, config.name_budget);
            entry
        })
        .collect();

    debug!(entry_count, total_bytes, "decoded kernel table");
    Ok(Some(KernelSummary {
        entry_count,
        total_bytes,
        average_bytes: total_bytes as f64 / entry_count as f64,
        raw_entry_count,
        raw_name_count,
        size_stats,
        size_histogram,
        top_families,
        top_kernels,
        demangling,
        pairing: pairing_report,
    }))
}
