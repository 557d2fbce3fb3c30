//! Statistical aggregation primitives shared by the kernel decoder and the
//! symbol rollups.
//!
//! The two percentile functions implement different policies and are kept
//! apart on purpose: kernel size distributions interpolate between ranks,
//! name-length statistics pick an existing sample. Reports produced by either
//! are compared against stored baselines, so neither may change silently.

pub mod histogram;
pub mod percentile;
pub mod tally;
pub mod topk;

pub use histogram::{fixed_bucket_histogram, HistogramBucket};
pub use percentile::{interpolated_percentile, nearest_rank_percentile};
pub use tally::Tally;
pub use topk::TopK;
