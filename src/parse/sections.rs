//! Section header listing parser.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::sections::SectionRecord;

static RE_SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[\s*\d+\]\s+(?P<name>\S+)\s+\S+\s+[0-9a-fA-F]+\s+[0-9a-fA-F]+\s+(?P<size>[0-9a-fA-F]+)\s+\S+\s+(?P<flags>[A-Za-z]*)",
    )
    .expect("valid section header regex")
});

/// Parse `[N] name type addr off size es flags ...` lines; sizes are hex.
///
/// Lines that do not look like a section header (titles, key legends) are
/// skipped. The unnamed null section matches with its type as the name and
/// contributes zero bytes.
pub fn parse_section_headers(text: &str) -> Vec<SectionRecord> {
    text.lines()
        .filter_map(|line| {
            let caps = RE_SECTION_HEADER.captures(line)?;
            let size = match u64::from_str_radix(&caps["size"], 16) {
                Ok(size) => size,
                Err(err) => {
                    trace!(line, error = %err, "skipping section header");
                    return None;
                }
            };
            Some(SectionRecord {
                name: caps["name"].to_string(),
                size,
                flags: caps["flags"].to_string(),
            })
        })
        .collect()
}
