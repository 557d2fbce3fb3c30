//! Kernel family classification by namespace marker.

/// Markers tested in order; the tail after a marker is kept to the given depth.
const FAMILY_MARKERS: &[(&str, usize)] = &[
    ("oneapi::dal::", 3),
    ("oneapi::mkl::", 3),
    ("daal::", 3),
    ("sycl::_V1::", 2),
];

/// Family that does not match any marker.
pub const OTHER_FAMILY: &str = "other";

/// Mangled identifier of a kernel table name.
///
/// Names carrying a per-kernel prefix (`<prefix>._Z...`) keep the text after
/// the first `.`.
pub fn kernel_identifier(name: &str) -> &str {
    if name.contains("._Z") {
        if let Some((_, rest)) = name.split_once('.') {
            return rest;
        }
    }
    name
}

pub fn classify_family(demangled: &str) -> String {
    for &(marker, depth) in FAMILY_MARKERS {
        let Some((_, tail)) = demangled.split_once(marker) else {
            continue;
        };
        let parts: Vec<&str> = tail.split("::").filter(|t| !t.is_empty()).take(depth).collect();
        if parts.is_empty() {
            return marker.trim_end_matches(':').to_string();
        }
        return format!("{marker}{}", parts.join("::"));
    }
    OTHER_FAMILY.to_string()
}
