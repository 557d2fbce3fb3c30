//! Fixed-bucket histograms.

use serde::{Deserialize, Serialize};

/// One emitted histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub bucket: String,
    pub count: u64,
}

/// Count `values` into buckets with inclusive, ascending upper bounds.
///
/// Values above the last bound land in the overflow bucket. Only non-empty
/// buckets are emitted, in bound order, followed by the overflow bucket.
pub fn fixed_bucket_histogram<I>(
    values: I,
    bounds: &[(u64, &str)],
    overflow_label: &str,
) -> Vec<HistogramBucket>
where
    I: IntoIterator<Item = u64>,
{
    let mut counts = vec![0u64; bounds.len() + 1];
    for value in values {
        let slot = bounds
            .iter()
            .position(|(upper, _)| value <= *upper)
            .unwrap_or(bounds.len());
        counts[slot] += 1;
    }

    bounds
        .iter()
        .map(|(_, label)| *label)
        .chain(std::iter::once(overflow_label))
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| HistogramBucket {
            bucket: label.to_string(),
            count,
        })
        .collect()
}
