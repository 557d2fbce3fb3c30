//! Static symbol table rollups.
//!
//! One pass over the classified records of a library feeds every counter,
//! namespace tally and top-K ranking; nothing retains the full record list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classify::{namespace_key, namespace_tokens};
use super::types::{Binding, StorageClass, SymbolRecord, SymbolType};
use crate::stats::{nearest_rank_percentile, Tally, TopK};

/// A symbol in a size ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSymbol {
    pub name: String,
    pub size: u64,
}

/// A symbol in the longest-name ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestName {
    pub name: String,
    pub length: u64,
    pub bind: Binding,
    #[serde(rename = "type")]
    pub symbol_type: SymbolType,
    pub size: u64,
}

// Equal lengths rank by name, then binding, type and size.
impl Ord for LongestName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.name, self.bind.as_str(), self.symbol_type.as_str(), self.size).cmp(&(
            &other.name,
            other.bind.as_str(),
            other.symbol_type.as_str(),
            other.size,
        ))
    }
}

impl PartialOrd for LongestName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Display-name length distribution (nearest-rank percentiles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameLengthStats {
    pub count: u64,
    pub average: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub max: u64,
}

impl NameLengthStats {
    fn from_lengths(mut lengths: Vec<u64>) -> Option<Self> {
        lengths.sort_unstable();
        let max = *lengths.last()?;
        let count = lengths.len() as u64;
        let total: u64 = lengths.iter().sum();
        Some(Self {
            count,
            average: total as f64 / count as f64,
            p50: nearest_rank_percentile(&lengths, 0.5)?,
            p90: nearest_rank_percentile(&lengths, 0.9)?,
            p99: nearest_rank_percentile(&lengths, 0.99)?,
            max,
        })
    }
}

/// Aggregates of one library's static symbol table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSymbolSummary {
    /// Every parsed record, undefined ones included.
    pub total_symbols: u64,
    pub defined_symbols: u64,
    pub counts_by_bind: BTreeMap<String, u64>,
    pub size_by_bind: BTreeMap<String, u64>,
    /// Keyed by upper-cased kind code.
    pub counts_by_kind: BTreeMap<String, u64>,
    pub size_by_kind: BTreeMap<String, u64>,
    pub counts_by_storage: BTreeMap<String, u64>,
    pub size_by_storage: BTreeMap<String, u64>,
    pub counts_by_type: BTreeMap<String, u64>,
    pub size_by_type: BTreeMap<String, u64>,
    pub namespace_level3_all: Vec<(String, u64)>,
    pub namespace_level3_local: Vec<(String, u64)>,
    pub namespace_level3_global: Vec<(String, u64)>,
    pub namespace_rodata: Vec<(String, u64)>,
    pub namespace_rwdata: Vec<(String, u64)>,
    pub namespace_bss: Vec<(String, u64)>,
    /// Approximate string table footprint: name length plus terminator.
    pub name_bytes_by_bind: BTreeMap<String, u64>,
    pub top_local_functions: Vec<RankedSymbol>,
    pub top_global_functions: Vec<RankedSymbol>,
    pub top_local_objects: Vec<RankedSymbol>,
    pub top_global_objects: Vec<RankedSymbol>,
    pub top_rodata_objects: Vec<RankedSymbol>,
    pub top_rw_objects: Vec<RankedSymbol>,
    pub top_bss_objects: Vec<RankedSymbol>,
    pub longest_names: Vec<LongestName>,
    /// Absent when no defined symbol has a name.
    pub name_length_stats: Option<NameLengthStats>,
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str, amount: u64) {
    let total = map.entry(key.to_string()).or_insert(0);
    *total = total.saturating_add(amount);
}

fn ranked(top: TopK<String>) -> Vec<RankedSymbol> {
    top.into_sorted_vec()
        .into_iter()
        .map(|(size, name)| RankedSymbol { name, size })
        .collect()
}

/// Incremental builder for [`StaticSymbolSummary`].
pub struct StaticRollup {
    limit: usize,
    total_symbols: u64,
    defined_symbols: u64,
    counts_by_bind: BTreeMap<String, u64>,
    size_by_bind: BTreeMap<String, u64>,
    counts_by_kind: BTreeMap<String, u64>,
    size_by_kind: BTreeMap<String, u64>,
    counts_by_storage: BTreeMap<String, u64>,
    size_by_storage: BTreeMap<String, u64>,
    counts_by_type: BTreeMap<String, u64>,
    size_by_type: BTreeMap<String, u64>,
    namespace_all: Tally<u64>,
    namespace_local: Tally<u64>,
    namespace_global: Tally<u64>,
    namespace_rodata: Tally<u64>,
    namespace_rwdata: Tally<u64>,
    namespace_bss: Tally<u64>,
    name_bytes_by_bind: BTreeMap<String, u64>,
    name_lengths: Vec<u64>,
    local_functions: TopK<String>,
    global_functions: TopK<String>,
    local_objects: TopK<String>,
    global_objects: TopK<String>,
    rodata_objects: TopK<String>,
    rw_objects: TopK<String>,
    bss_objects: TopK<String>,
    longest_names: TopK<LongestName>,
}

impl StaticRollup {
    /// `limit` caps every ranking and namespace list.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            total_symbols: 0,
            defined_symbols: 0,
            counts_by_bind: BTreeMap::new(),
            size_by_bind: BTreeMap::new(),
            counts_by_kind: BTreeMap::new(),
            size_by_kind: BTreeMap::new(),
            counts_by_storage: BTreeMap::new(),
            size_by_storage: BTreeMap::new(),
            counts_by_type: BTreeMap::new(),
            size_by_type: BTreeMap::new(),
            namespace_all: Tally::new(),
            namespace_local: Tally::new(),
            namespace_global: Tally::new(),
            namespace_rodata: Tally::new(),
            namespace_rwdata: Tally::new(),
            namespace_bss: Tally::new(),
            name_bytes_by_bind: BTreeMap::new(),
            name_lengths: Vec::new(),
            local_functions: TopK::new(limit),
            global_functions: TopK::new(limit),
            local_objects: TopK::new(limit),
            global_objects: TopK::new(limit),
            rodata_objects: TopK::new(limit),
            rw_objects: TopK::new(limit),
            bss_objects: TopK::new(limit),
            longest_names: TopK::new(limit),
        }
    }

    pub fn add(&mut self, record: &SymbolRecord) {
        self.total_symbols += 1;
        if !record.is_defined() {
            return;
        }
        self.defined_symbols += 1;

        let size = record.size;
        let bind = record.bind.as_str();
        let kind = record.kind.to_ascii_uppercase().to_string();
        let storage = record.storage.as_str();
        let symbol_type = record.symbol_type.as_str();

        bump(&mut self.counts_by_kind, &kind, 1);
        bump(&mut self.size_by_kind, &kind, size);
        bump(&mut self.counts_by_storage, storage, 1);
        bump(&mut self.size_by_storage, storage, size);
        bump(&mut self.counts_by_bind, bind, 1);
        bump(&mut self.size_by_bind, bind, size);
        bump(&mut self.counts_by_type, symbol_type, 1);
        bump(&mut self.size_by_type, symbol_type, size);

        let display = record.display_name();
        let length = display.chars().count() as u64;
        if length > 0 {
            self.name_lengths.push(length);
            bump(&mut self.name_bytes_by_bind, bind, length + 1);
            if self.longest_names.len() < self.longest_names.capacity()
                || self.longest_names.min_metric().is_some_and(|m| length > m)
            {
                self.longest_names.push(
                    length,
                    LongestName {
                        name: display.to_string(),
                        length,
                        bind: record.bind,
                        symbol_type: record.symbol_type,
                        size,
                    },
                );
            }
        }

        let local = record.bind == Binding::Local;
        let has_tokens = !namespace_tokens(display).is_empty();
        if has_tokens && size > 0 {
            let key = namespace_key(display);
            self.namespace_all.add(&key, size);
            if local {
                self.namespace_local.add(&key, size);
            } else {
                self.namespace_global.add(&key, size);
            }
        }

        if size == 0 {
            return;
        }
        match record.symbol_type {
            SymbolType::Func => {
                let top = if local {
                    &mut self.local_functions
                } else {
                    &mut self.global_functions
                };
                top.push(size, display.to_string());
            }
            SymbolType::Object => {
                let top = if local {
                    &mut self.local_objects
                } else {
                    &mut self.global_objects
                };
                top.push(size, display.to_string());

                let key = namespace_key(display);
                let (tally, top) = match record.storage {
                    StorageClass::Rodata => (&mut self.namespace_rodata, &mut self.rodata_objects),
                    StorageClass::Rwdata | StorageClass::Common => {
                        (&mut self.namespace_rwdata, &mut self.rw_objects)
                    }
                    StorageClass::Bss => (&mut self.namespace_bss, &mut self.bss_objects),
                    _ => return,
                };
                tally.add(&key, size);
                top.push(size, display.to_string());
            }
            SymbolType::Unknown => {}
        }
    }

    pub fn finish(self) -> StaticSymbolSummary {
        let limit = self.limit;
        StaticSymbolSummary {
            total_symbols: self.total_symbols,
            defined_symbols: self.defined_symbols,
            counts_by_bind: self.counts_by_bind,
            size_by_bind: self.size_by_bind,
            counts_by_kind: self.counts_by_kind,
            size_by_kind: self.size_by_kind,
            counts_by_storage: self.counts_by_storage,
            size_by_storage: self.size_by_storage,
            counts_by_type: self.counts_by_type,
            size_by_type: self.size_by_type,
            namespace_level3_all: self.namespace_all.most_common(limit),
            namespace_level3_local: self.namespace_local.most_common(limit),
            namespace_level3_global: self.namespace_global.most_common(limit),
            namespace_rodata: self.namespace_rodata.most_common(limit),
            namespace_rwdata: self.namespace_rwdata.most_common(limit),
            namespace_bss: self.namespace_bss.most_common(limit),
            name_bytes_by_bind: self.name_bytes_by_bind,
            top_local_functions: ranked(self.local_functions),
            top_global_functions: ranked(self.global_functions),
            top_local_objects: ranked(self.local_objects),
            top_global_objects: ranked(self.global_objects),
            top_rodata_objects: ranked(self.rodata_objects),
            top_rw_objects: ranked(self.rw_objects),
            top_bss_objects: ranked(self.bss_objects),
            longest_names: self
                .longest_names
                .into_sorted_vec()
                .into_iter()
                .map(|(_, entry)| entry)
                .collect(),
            name_length_stats: NameLengthStats::from_lengths(self.name_lengths),
        }
    }
}

/// Summarize a whole static table.
pub fn summarize_static(records: &[SymbolRecord], limit: usize) -> StaticSymbolSummary {
    let mut rollup = StaticRollup::new(limit);
    for record in records {
        rollup.add(record);
    }
    rollup.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::classify::{classify_kind, storage_class};

    fn record(name: &str, kind: char, size: u64) -> SymbolRecord {
        let (bind, symbol_type) = classify_kind(kind);
        SymbolRecord {
            name: name.to_string(),
            demangled: name.to_string(),
            size,
            kind,
            bind,
            symbol_type,
            storage: storage_class(kind),
        }
    }

    fn sample() -> Vec<SymbolRecord> {
        vec![
            record("oneapi::dal::svm::train", 'T', 400),
            record("oneapi::dal::svm::detail::helper", 't', 100),
            record("daal::services::table", 'R', 64),
            record("daal::state", 'd', 32),
            record("scratch", 'B', 16),
            record("memcpy", 'U', 0),
            record("vtable for daal::Base", 'V', 24),
        ]
    }

    #[test]
    fn test_undefined_excluded_from_aggregates() {
        let summary = summarize_static(&sample(), 50);
        assert_eq!(summary.total_symbols, 7);
        assert_eq!(summary.defined_symbols, 6);
        assert!(!summary.counts_by_bind.contains_key("UNDEFINED"));
        assert!(!summary.counts_by_kind.contains_key("U"));
        assert!(summary.longest_names.iter().all(|n| n.name != "memcpy"));
    }

    #[test]
    fn test_equal_sizes_rank_by_name_descending() {
        let records = vec![
            record("alpha", 'T', 8),
            record("gamma", 'T', 8),
            record("beta", 'T', 8),
            record("delta", 'T', 9),
        ];
        let summary = summarize_static(&records, 3);
        let names: Vec<&str> = summary
            .top_global_functions
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["delta", "gamma", "beta"]);

        let longest: Vec<&str> = summary.longest_names.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(longest, vec!["gamma", "delta", "alpha"]);
    }

    #[test]
    fn test_counts_and_sizes() {
        let summary = summarize_static(&sample(), 50);
        assert_eq!(summary.counts_by_bind["GLOBAL"], 3);
        assert_eq!(summary.counts_by_bind["LOCAL"], 2);
        assert_eq!(summary.counts_by_bind["WEAK"], 1);
        assert_eq!(summary.size_by_kind["T"], 500);
        assert_eq!(summary.size_by_storage["rwdata"], 56);
        assert_eq!(summary.size_by_type["FUNC"], 500);
        assert_eq!(
            summary.name_bytes_by_bind["LOCAL"],
            ("oneapi::dal::svm::detail::helper".len() + 1 + "daal::state".len() + 1) as u64
        );
    }

    #[test]
    fn test_namespace_rollups() {
        let summary = summarize_static(&sample(), 50);
        assert_eq!(
            summary.namespace_level3_all[0],
            ("oneapi::dal::svm".to_string(), 500)
        );
        assert_eq!(
            summary.namespace_level3_local,
            vec![("oneapi::dal::svm".to_string(), 100), ("daal".to_string(), 32)]
        );
        assert_eq!(
            summary.namespace_rodata,
            vec![("daal::services::table".to_string(), 64)]
        );
        assert_eq!(
            summary.namespace_rwdata,
            vec![("daal".to_string(), 32), ("vtable for daal".to_string(), 24)]
        );
        assert_eq!(summary.namespace_bss, vec![("scratch".to_string(), 16)]);
    }

    #[test]
    fn test_rankings() {
        let summary = summarize_static(&sample(), 50);
        assert_eq!(summary.top_global_functions[0].name, "oneapi::dal::svm::train");
        assert_eq!(summary.top_local_functions[0].size, 100);
        assert_eq!(summary.top_rw_objects.len(), 2);
        assert_eq!(summary.top_rw_objects[0].name, "daal::state");
        assert_eq!(summary.top_bss_objects[0].name, "scratch");
        assert_eq!(summary.longest_names[0].name, "oneapi::dal::svm::detail::helper");
        assert_eq!(summary.longest_names[0].bind, Binding::Local);
    }

    #[test]
    fn test_limit_bounds_rankings() {
        let records: Vec<SymbolRecord> = (1..=10)
            .map(|i| record(&format!("f{i}"), 'T', i * 10))
            .collect();
        let summary = summarize_static(&records, 3);
        let sizes: Vec<u64> = summary.top_global_functions.iter().map(|s| s.size).collect();
        assert_eq!(sizes, vec![100, 90, 80]);
        assert_eq!(summary.longest_names.len(), 3);
    }

    #[test]
    fn test_name_length_stats() {
        let records: Vec<SymbolRecord> = ["a", "bb", "ccc", "dddd"]
            .iter()
            .map(|n| record(n, 'T', 1))
            .collect();
        let stats = summarize_static(&records, 50).name_length_stats.unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.average, 2.5);
        // index round(0.5 * 3) = round(1.5) = 2 (ties to even)
        assert_eq!(stats.p50, 3);
        assert_eq!(stats.max, 4);
        assert!(summarize_static(&[], 50).name_length_stats.is_none());
    }
}
