//! Dependency listing parser.

/// Trimmed, non-empty lines of a dependency listing.
pub fn parse_dependency_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
