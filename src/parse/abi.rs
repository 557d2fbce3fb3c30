//! ABI audit report parser.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_PLATFORM_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"platform tag: "([^"]+)""#).expect("valid platform tag regex"));
static RE_CONSTRAINED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"This constrains the platform tag to "([^"]+)""#)
        .expect("valid constrained tag regex")
});
static RE_SYSTEM_LIBS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)system-provided shared libraries:(.*?)(?:\n\n|$)")
        .expect("valid system libraries regex")
});

/// Platform compatibility facts extracted from the auditor's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiReport {
    pub platform_tag: Option<String>,
    pub constrained_tag: Option<String>,
    /// System libraries the package links against, e.g. `libm.so.6`.
    pub external_libs: Vec<String>,
    pub raw_output: String,
}

pub fn parse_abi_report(text: &str) -> AbiReport {
    let capture = |re: &Regex| re.captures(text).map(|c| c[1].to_string());

    let external_libs = RE_SYSTEM_LIBS
        .captures(text)
        .map(|caps| {
            caps[1]
                .replace(['{', '}'], " ")
                .split(',')
                .map(str::trim)
                .filter(|token| token.starts_with("lib") && token.contains(' '))
                .filter_map(|token| token.split_whitespace().next())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    AbiReport {
        platform_tag: capture(&RE_PLATFORM_TAG),
        constrained_tag: capture(&RE_CONSTRAINED_TAG),
        external_libs,
        raw_output: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUDIT: &str = r#"
daal-2025.0.0-py2.py3-none-manylinux_2_28_x86_64.whl is consistent with
the following platform tag: "manylinux_2_28_x86_64".

The wheel references external versioned symbols in these
system-provided shared libraries: libm.so.6 with versions {'GLIBC_2.2.5'},
libc.so.6 with versions {'GLIBC_2.14', 'GLIBC_2.2.5'}, libdl.so.2 with
versions {'GLIBC_2.2.5'}

This constrains the platform tag to "manylinux_2_17_x86_64". In order
to achieve a more compatible tag, you would need to recompile.
"#;

    #[test]
    fn extracts_tags_and_libraries() {
        let report = parse_abi_report(AUDIT);
        assert_eq!(report.platform_tag.as_deref(), Some("manylinux_2_28_x86_64"));
        assert_eq!(
            report.constrained_tag.as_deref(),
            Some("manylinux_2_17_x86_64")
        );
        assert_eq!(report.external_libs, vec!["libm.so.6", "libc.so.6", "libdl.so.2"]);
        assert_eq!(report.raw_output, AUDIT);
    }

    #[test]
    fn unrelated_text_yields_empty_report() {
        let report = parse_abi_report("nothing to see\n");
        assert_eq!(report.platform_tag, None);
        assert!(report.external_libs.is_empty());
    }
}
