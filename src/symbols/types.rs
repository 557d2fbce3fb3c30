//! Symbol types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility/linkage class derived from the listing's kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Binding {
    Local,
    Weak,
    Global,
    Undefined,
}

impl Binding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Binding::Local => "LOCAL",
            Binding::Weak => "WEAK",
            Binding::Global => "GLOBAL",
            Binding::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymbolType {
    Func,
    Object,
    Unknown,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Func => "FUNC",
            SymbolType::Object => "OBJECT",
            SymbolType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary region a symbol's bytes occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Text,
    Rodata,
    Rwdata,
    Bss,
    Common,
    Absolute,
    Other,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Text => "text",
            StorageClass::Rodata => "rodata",
            StorageClass::Rwdata => "rwdata",
            StorageClass::Bss => "bss",
            StorageClass::Common => "common",
            StorageClass::Absolute => "absolute",
            StorageClass::Other => "other",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified symbol-table record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Name as listed (mangled).
    pub name: String,
    /// Display name; equals `name` when demangling degraded.
    pub demangled: String,
    pub size: u64,
    /// Raw kind code from the listing.
    pub kind: char,
    pub bind: Binding,
    #[serde(rename = "type")]
    pub symbol_type: SymbolType,
    pub storage: StorageClass,
}

impl SymbolRecord {
    pub fn is_defined(&self) -> bool {
        self.bind != Binding::Undefined
    }

    /// Demangled name, falling back to the listed name when empty.
    pub fn display_name(&self) -> &str {
        if self.demangled.is_empty() {
            &self.name
        } else {
            &self.demangled
        }
    }
}
