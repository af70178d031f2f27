//! # geomoran Algorithms
//!
//! Spatial autocorrelation analysis for point data on the sphere.
//!
//! ## Available Algorithm Categories
//!
//! - **spatial**: haversine distance, k-nearest-neighbor weights
//! - **statistics**: Global Moran's I, permutation test
//! - **regions**: bounding-box region labels, baseline and enrichment tables
//!
//! Weights are built once per point set and shared by the analytic and
//! the permutation test; neither mutates them.

pub(crate) mod maybe_rayon;
pub mod regions;
pub mod spatial;
pub mod statistics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::regions::{baseline, classify, enrichment, Baseline, Enrichment, Region};
    pub use crate::spatial::{haversine_km, knn_weights, KnnWeights, KnnWeightsParams, WeightScheme};
    pub use crate::statistics::{
        global_morans_i, permutation_test, Degeneracy, MoransI, MoransIResult,
        PermutationOutcome, PermutationParams, PermutationResult, PermutationTest,
    };
    pub use geomoran_core::prelude::*;
    pub use geomoran_parallel::ProcessingMode;
}
