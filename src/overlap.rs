//! Cross-library symbol overlap.
//!
//! Works on demangled-name-to-size maps, one per library, and reports what
//! every pair of libraries has in common.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::OverlapConfig;
use crate::stats::Tally;
use crate::symbols::{namespace_tokens, tiered_prefix};

/// A shared symbol with its size on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedSymbol {
    pub name: String,
    pub size_a: u64,
    pub size_b: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedNamespace {
    pub namespace: String,
    pub count: u64,
    pub size_a: u64,
    pub size_b: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairOverlap {
    pub library_a: String,
    pub library_b: String,
    pub shared_count: u64,
    pub top_symbols: Vec<SharedSymbol>,
    pub top_namespaces: Vec<SharedNamespace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleOverlap {
    pub shared_count: u64,
    /// Lexicographically first shared names.
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapReport {
    /// Every unordered pair, `a` before `b` in input order.
    pub pairs: Vec<PairOverlap>,
    /// Present only when exactly three libraries were compared.
    pub triple_overlap: Option<TripleOverlap>,
}

/// Namespace of a shared name: four tokens, else three, two, one; the
/// whole name when it has no tokens.
fn shared_namespace(name: &str) -> String {
    let tokens = namespace_tokens(name);
    tiered_prefix(&tokens, &[4, 3, 2, 1]).unwrap_or_else(|| name.to_string())
}

impl PairOverlap {
    /// `"<a>::<b>"`.
    pub fn key(&self) -> String {
        format!("{}::{}", self.library_a, self.library_b)
    }
}

impl OverlapReport {
    pub fn pair(&self, library_a: &str, library_b: &str) -> Option<&PairOverlap> {
        self.pairs
            .iter()
            .find(|p| p.library_a == library_a && p.library_b == library_b)
    }
}

fn overlap_pair(
    (name_a, a): (&str, &HashMap<String, u64>),
    (name_b, b): (&str, &HashMap<String, u64>),
    config: &OverlapConfig,
) -> PairOverlap {
    let mut shared: Vec<&String> = a.keys().filter(|name| b.contains_key(*name)).collect();
    shared.sort();

    let mut symbols: Vec<SharedSymbol> = shared
        .iter()
        .map(|&name| SharedSymbol {
            name: name.clone(),
            size_a: a[name],
            size_b: b[name],
        })
        .collect();
    // Stable sort over name-ordered input: ties stay in name order.
    symbols.sort_by(|x, y| x.size_a.max(x.size_b).cmp(&y.size_a.max(y.size_b)).reverse());
    symbols.truncate(config.top_symbols);

    let mut namespaces: Tally<SharedNamespace> = Tally::new();
    for &name in &shared {
        let entry = namespaces.entry(&shared_namespace(name));
        entry.count += 1;
        entry.size_a = entry.size_a.saturating_add(a[name]);
        entry.size_b = entry.size_b.saturating_add(b[name]);
    }
    let top_namespaces = namespaces
        .ranked_by(|ns| u128::from(ns.size_a) + u128::from(ns.size_b), config.top_namespaces)
        .into_iter()
        .map(|(namespace, stats)| SharedNamespace { namespace, ..stats })
        .collect();

    PairOverlap {
        library_a: name_a.to_string(),
        library_b: name_b.to_string(),
        shared_count: shared.len() as u64,
        top_symbols: symbols,
        top_namespaces,
    }
}

/// Overlap of every unordered pair, plus the triple intersection for three libraries.
pub fn compute_overlap(
    libraries: &[(String, HashMap<String, u64>)],
    config: &OverlapConfig,
) -> OverlapReport {
    let mut pairs = Vec::new();
    for (i, (name_a, map_a)) in libraries.iter().enumerate() {
        for (name_b, map_b) in &libraries[i + 1..] {
            pairs.push(overlap_pair(
                (name_a.as_str(), map_a),
                (name_b.as_str(), map_b),
                config,
            ));
        }
    }

    let triple_overlap = match libraries {
        [(_, a), (_, b), (_, c)] => {
            let mut shared: Vec<&String> = a
                .keys()
                .filter(|name| b.contains_key(*name) && c.contains_key(*name))
                .collect();
            shared.sort();
            Some(TripleOverlap {
                shared_count: shared.len() as u64,
                examples: shared
                    .into_iter()
                    .take(config.triple_examples)
                    .cloned()
                    .collect(),
            })
        }
        _ => None,
    };

    OverlapReport {
        pairs,
        triple_overlap,
    }
}
