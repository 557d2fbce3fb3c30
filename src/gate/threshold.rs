//! Growth threshold parsing.

use std::fmt;

use crate::error::{Result, ScanError};

/// Maximum allowed growth of one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthThreshold {
    /// Relative growth, `0.05` for `5%`.
    Fraction(f64),
    /// Absolute growth in bytes.
    Bytes(f64),
}

const SUFFIXES: &[(char, f64)] = &[
    ('K', 1024.0),
    ('M', 1024.0 * 1024.0),
    ('G', 1024.0 * 1024.0 * 1024.0),
];

fn parse_number(text: &str, original: &str) -> Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ScanError::InvalidThreshold(original.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ScanError::InvalidThreshold(original.to_string()));
    }
    Ok(value)
}

impl GrowthThreshold {
    /// Parse `N%`, or `N` / `NK` / `NM` / `NG` bytes (powers of 1024, suffix
    /// case-insensitive, fractional `N` allowed).
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            return Ok(GrowthThreshold::Fraction(parse_number(percent, text)? / 100.0));
        }
        let upper = trimmed.to_ascii_uppercase();
        for &(suffix, multiplier) in SUFFIXES {
            if let Some(number) = upper.strip_suffix(suffix) {
                return Ok(GrowthThreshold::Bytes(parse_number(number, text)? * multiplier));
            }
        }
        Ok(GrowthThreshold::Bytes(parse_number(trimmed, text)?))
    }

    /// Whether `growth` over `baseline` exceeds the threshold. A zero
    /// baseline has infinite relative growth.
    pub fn is_exceeded(&self, baseline: u64, growth: u64) -> bool {
        if growth == 0 {
            return false;
        }
        match *self {
            GrowthThreshold::Fraction(limit) => {
                if baseline == 0 {
                    return true;
                }
                growth as f64 / baseline as f64 > limit
            }
            GrowthThreshold::Bytes(limit) => growth as f64 > limit,
        }
    }
}

impl fmt::Display for GrowthThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowthThreshold::Fraction(fraction) => write!(f, "{}%", fraction * 100.0),
            GrowthThreshold::Bytes(bytes) => write!(f, "{bytes} bytes"),
        }
    }
}
