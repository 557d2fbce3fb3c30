//! Kind-code classification and namespace keys.

use super::types::{Binding, StorageClass, SymbolType};

/// Binding and type for one kind code.
///
/// `U`/`u` is undefined. `W`/`V` in either case are weak; any other
/// lower-case code is local.
pub fn classify_kind(kind: char) -> (Binding, SymbolType) {
    let upper = kind.to_ascii_uppercase();
    if upper == 'U' {
        return (Binding::Undefined, SymbolType::Unknown);
    }
    let bind = if matches!(upper, 'W' | 'V') {
        Binding::Weak
    } else if kind.is_lowercase() {
        Binding::Local
    } else {
        Binding::Global
    };
    let symbol_type = match upper {
        'T' | 'W' => SymbolType::Func,
        'V' | 'D' | 'B' | 'R' | 'S' | 'C' => SymbolType::Object,
        _ => SymbolType::Unknown,
    };
    (bind, symbol_type)
}

pub fn storage_class(kind: char) -> StorageClass {
    match kind.to_ascii_uppercase() {
        'T' | 'W' => StorageClass::Text,
        'R' => StorageClass::Rodata,
        'D' | 'S' | 'V' => StorageClass::Rwdata,
        'B' => StorageClass::Bss,
        'C' => StorageClass::Common,
        'A' => StorageClass::Absolute,
        _ => StorageClass::Other,
    }
}

/// Non-empty `::`-separated tokens of a display name.
pub fn namespace_tokens(name: &str) -> Vec<&str> {
    name.split("::").filter(|t| !t.is_empty()).collect()
}

/// Join the first `depth` tokens for the first depth in `tiers` the name
/// reaches; `None` when it reaches none.
pub fn tiered_prefix(tokens: &[&str], tiers: &[usize]) -> Option<String> {
    tiers
        .iter()
        .find(|&&depth| depth > 0 && tokens.len() >= depth)
        .map(|&depth| tokens[..depth].join("::"))
}

/// Namespace key used by the static rollups: three tokens, else the first
/// token, else the whole name.
pub fn namespace_key(display_name: &str) -> String {
    let tokens = namespace_tokens(display_name);
    tiered_prefix(&tokens, &[3, 1]).unwrap_or_else(|| display_name.to_string())
}
