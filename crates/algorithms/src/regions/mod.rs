//! Region labels and refugia enrichment
//!
//! Descriptive tabulation only; kept apart from the autocorrelation
//! statistics, which never look at region labels.

mod classify;
mod enrichment;

pub use classify::{classify, classify_point, is_refugia, Region};
pub use enrichment::{baseline, dedup_sites, enrichment, Baseline, Enrichment, RegionCounts};
