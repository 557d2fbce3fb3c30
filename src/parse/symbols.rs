//! POSIX-format symbol listing parser.
//!
//! Lines look like `name kind value size`. The mangled listing splits on
//! whitespace; the demangled listing splits from the right so display names
//! may contain spaces.

use tracing::trace;

/// One parsed listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    pub name: String,
    pub kind: char,
    pub size: u64,
}

/// How the name column of a listing is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLayout {
    /// Names without spaces; exactly four whitespace-separated fields.
    Mangled,
    /// Names may contain spaces; the last three fields are split off the right.
    Demangled,
}

/// Parse a size column: decimal (leading zeros allowed) or `0x` hex.
pub fn parse_size(field: &str) -> Option<u64> {
    match field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => field.parse().ok(),
    }
}

fn split_fields(line: &str, layout: NameLayout) -> Option<[&str; 4]> {
    match layout {
        NameLayout::Mangled => {
            let mut fields = line.split_whitespace();
            let parsed = [fields.next()?, fields.next()?, fields.next()?, fields.next()?];
            fields.next().is_none().then_some(parsed)
        }
        NameLayout::Demangled => {
            let mut fields = line.rsplitn(4, ' ');
            let size = fields.next()?;
            let value = fields.next()?;
            let kind = fields.next()?;
            let name = fields.next()?;
            Some([name, kind, value, size])
        }
    }
}

/// Parse every well-formed record; diagnostics and malformed lines are skipped.
pub fn parse_symbol_listing(text: &str, layout: NameLayout) -> Vec<RawSymbol> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("nm:"))
        .filter_map(|line| {
            let Some([name, kind, _value, size]) = split_fields(line, layout) else {
                trace!(line, "skipping symbol line with unexpected field count");
                return None;
            };
            let mut kind_chars = kind.chars();
            let (Some(kind), None) = (kind_chars.next(), kind_chars.next()) else {
                trace!(line, "skipping symbol line with multi-character kind");
                return None;
            };
            let Some(size) = parse_size(size) else {
                trace!(line, "skipping symbol line with unparsable size");
                return None;
            };
            Some(RawSymbol {
                name: name.to_string(),
                kind,
                size,
            })
        })
        .collect()
}
