//! Dynamic symbol table summary.

use serde::{Deserialize, Serialize};

use super::classify::{namespace_tokens, tiered_prefix};
use super::types::{Binding, SymbolRecord, SymbolType};
use crate::stats::Tally;

/// One exported or imported-and-defined dynamic symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSymbol {
    pub name: String,
    pub demangled: String,
    pub size: u64,
    pub bind: Binding,
    #[serde(rename = "type")]
    pub symbol_type: SymbolType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSymbolSummary {
    /// Every defined symbol, largest first.
    pub symbols: Vec<DynamicSymbol>,
    /// Three tokens, else the first token.
    pub namespace_level3: Vec<(String, u64)>,
    /// Four tokens, else two tokens.
    pub namespace_level4: Vec<(String, u64)>,
}

impl DynamicSymbolSummary {
    /// Demangled name to size, the input of the overlap analysis.
    ///
    /// Symbols without a demangled form are left out; for repeated names the
    /// smallest listed size wins.
    pub fn size_map(&self) -> std::collections::HashMap<String, u64> {
        // Sorted largest first, so a repeated name keeps its smallest size.
        self.symbols
            .iter()
            .filter(|s| !s.demangled.is_empty())
            .map(|s| (s.demangled.clone(), s.size))
            .collect()
    }
}

pub fn summarize_dynamic(records: &[SymbolRecord], namespace_limit: usize) -> DynamicSymbolSummary {
    let mut level3 = Tally::new();
    let mut level4 = Tally::new();
    let mut symbols = Vec::new();

    for record in records.iter().filter(|r| r.is_defined()) {
        if !record.demangled.is_empty() {
            let tokens = namespace_tokens(&record.demangled);
            if let Some(key) = tiered_prefix(&tokens, &[3, 1]) {
                level3.add(&key, record.size);
            }
            if let Some(key) = tiered_prefix(&tokens, &[4, 2]) {
                level4.add(&key, record.size);
            }
        }
        symbols.push(DynamicSymbol {
            name: record.name.clone(),
            demangled: record.demangled.clone(),
            size: record.size,
            bind: record.bind,
            symbol_type: record.symbol_type,
        });
    }
    symbols.sort_by(|a, b| b.size.cmp(&a.size));

    DynamicSymbolSummary {
        symbols,
        namespace_level3: level3.most_common(namespace_limit),
        namespace_level4: level4.most_common(namespace_limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::classify::{classify_kind, storage_class};

    fn record(name: &str, demangled: &str, kind: char, size: u64) -> SymbolRecord {
        let (bind, symbol_type) = classify_kind(kind);
        SymbolRecord {
            name: name.to_string(),
            demangled: demangled.to_string(),
            size,
            kind,
            bind,
            symbol_type,
            storage: storage_class(kind),
        }
    }

    #[test]
    fn sorts_and_rolls_up() {
        let records = vec![
            record("_Z1a", "oneapi::dal::knn::infer", 'T', 10),
            record("_Z1b", "oneapi::dal::knn::train", 'T', 30),
            record("_Z1c", "daal::kernel", 'W', 5),
            record("free", "free", 'U', 0),
            record("solo", "solo", 'D', 8),
        ];
        let summary = summarize_dynamic(&records, 50);

        let sizes: Vec<u64> = summary.symbols.iter().map(|s| s.size).collect();
        assert_eq!(sizes, vec![30, 10, 8, 5]);
        assert_eq!(
            summary.namespace_level3,
            vec![
                ("oneapi::dal::knn".to_string(), 40),
                ("solo".to_string(), 8),
                ("daal".to_string(), 5),
            ]
        );
        assert_eq!(
            summary.namespace_level4,
            vec![
                ("oneapi::dal::knn::train".to_string(), 30),
                ("oneapi::dal::knn::infer".to_string(), 10),
                ("daal::kernel".to_string(), 5),
            ]
        );
    }

    #[test]
    fn size_map_skips_empty_names() {
        let summary = summarize_dynamic(
            &[record("x", "", 'T', 4), record("_Z1f", "f()", 'T', 2)],
            50,
        );
        let map = summary.size_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["f()"], 2);
    }
}
