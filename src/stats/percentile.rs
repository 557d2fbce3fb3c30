//! Percentile estimators over pre-sorted samples.

/// Percentile with linear interpolation between adjacent ranks.
///
/// `sorted` must be in ascending order and `p` in `[0, 1]`. A single sample
/// is returned exactly; an empty slice has no percentile.
pub fn interpolated_percentile(sorted: &[u64], p: f64) -> Option<f64> {
    match sorted {
        [] => None,
        [only] => Some(*only as f64),
        _ => {
            let rank = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                return Some(sorted[lower] as f64);
            }
            let lower_value = sorted[lower] as f64;
            let upper_value = sorted[upper] as f64;
            let weight = rank - lower as f64;
            Some(lower_value + (upper_value - lower_value) * weight)
        }
    }
}

/// Percentile that always returns one of the samples.
///
/// The index is `p * (n - 1)` rounded to the nearest integer, ties to even.
pub fn nearest_rank_percentile<T: Copy>(sorted: &[T], p: f64) -> Option<T> {
    match sorted {
        [] => None,
        [only] => Some(*only),
        _ => {
            let last = sorted.len() - 1;
            let index = (p.clamp(0.0, 1.0) * last as f64).round_ties_even() as usize;
            Some(sorted[index.min(last)])
        }
    }
}
