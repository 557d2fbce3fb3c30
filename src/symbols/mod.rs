//! # Symbols Module
//!
//! Classification and rollups of symbol-table listings. Raw listing records
//! are resolved to display names (from the demangled listing when it lines up
//! with the mangled one, from a batch demangle otherwise), classified, and
//! summarized per table.

pub mod classify;
pub mod dynamic;
pub mod rollup;
pub mod types;

pub use classify::{classify_kind, namespace_key, namespace_tokens, storage_class, tiered_prefix};
pub use dynamic::{summarize_dynamic, DynamicSymbol, DynamicSymbolSummary};
pub use rollup::{summarize_static, LongestName, NameLengthStats, RankedSymbol, StaticRollup, StaticSymbolSummary};
pub use types::{Binding, StorageClass, SymbolRecord, SymbolType};

use tracing::debug;

use crate::demangle::{DemangleStatus, Demangler};
use crate::parse::RawSymbol;

/// Classified records of one listing plus how their display names were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSymbols {
    pub records: Vec<SymbolRecord>,
    pub demangling: DemangleStatus,
}

/// Pair mangled records with display names and classify them.
///
/// The demangled listing is trusted only when it is non-empty and has the
/// same record count; otherwise every mangled name goes through `demangler`
/// in one batch.
pub fn resolve_symbols(
    mangled: Vec<RawSymbol>,
    demangled: Option<Vec<RawSymbol>>,
    demangler: &dyn Demangler,
) -> ResolvedSymbols {
    let listed = demangled.filter(|d| !d.is_empty() && d.len() == mangled.len());
    let (names, demangling) = match listed {
        Some(listing) => (
            listing.into_iter().map(|r| r.name).collect::<Vec<_>>(),
            DemangleStatus::Demangled,
        ),
        None => {
            debug!(count = mangled.len(), "demangled listing unusable, batch demangling");
            let batch: Vec<String> = mangled.iter().map(|r| r.name.clone()).collect();
            let outcome = demangler.demangle_batch(&batch);
            let status = outcome.status();
            (outcome.into_names(), status)
        }
    };

    let records = mangled
        .into_iter()
        .zip(names)
        .map(|(raw, demangled)| {
            let (bind, symbol_type) = classify_kind(raw.kind);
            SymbolRecord {
                storage: storage_class(raw.kind),
                name: raw.name,
                demangled,
                size: raw.size,
                kind: raw.kind,
                bind,
                symbol_type,
            }
        })
        .collect();

    ResolvedSymbols {
        records,
        demangling,
    }
}
