//! Spatial autocorrelation statistics
//!
//! - **autocorrelation**: Global Moran's I with randomization-null significance
//! - **permutation**: Monte Carlo permutation test for Moran's I

pub mod autocorrelation;
pub mod permutation;

pub use autocorrelation::{
    expected_i, global_morans_i, morans_i_statistic, normal_cdf, two_tailed_p, Degeneracy,
    MoransI, MoransIResult,
};
pub use permutation::{
    permutation_test, PermutationOutcome, PermutationParams, PermutationResult, PermutationTest,
    MIN_TRAIT_COUNT,
};
