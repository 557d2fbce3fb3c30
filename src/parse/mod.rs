//! Parsers for the textual output of the external inspection tools.
//!
//! Parsers never fail: lines that do not match the expected shape are
//! skipped and logged at `trace`.

pub mod abi;
pub mod deps;
pub mod sections;
pub mod symbols;

pub use abi::{parse_abi_report, AbiReport};
pub use deps::parse_dependency_lines;
pub use sections::parse_section_headers;
pub use symbols::{parse_size, parse_symbol_listing, NameLayout, RawSymbol};
