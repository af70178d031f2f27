//! Monte Carlo permutation test for Moran's I
//!
//! The weights stay fixed while the values are reassigned to locations
//! uniformly at random. Each trial draws from its own ChaCha stream,
//! derived from one root seed and the trial index, so the extreme count is
//! identical whether trials run sequentially, on all cores, or on a fixed
//! worker pool.

use crate::statistics::autocorrelation::morans_i_statistic;
use geomoran_core::{Algorithm, Error, Result, SpatialWeights};
use geomoran_parallel::{ParallelStrategy, ProcessingMode};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Fewer trait-carrying locations than this and the test is not run.
pub const MIN_TRAIT_COUNT: usize = 3;

/// Parameters for the permutation test
#[derive(Debug, Clone)]
pub struct PermutationParams {
    /// Number of random relabelings (>= 1)
    pub permutations: usize,
    /// Root seed; the same seed always gives the same p-value
    pub seed: u64,
    pub mode: ProcessingMode,
    /// Abort the whole test if it runs longer than this
    pub deadline: Option<Duration>,
}

impl PermutationParams {
    /// Reject zero permutations and an empty worker pool.
    pub fn validate(&self) -> Result<()> {
        if self.permutations == 0 {
            return Err(Error::invalid_parameter(
                "permutations",
                0,
                "need at least one permutation",
            ));
        }
        self.mode.validate()
    }
}

impl Default for PermutationParams {
    fn default() -> Self {
        Self {
            permutations: 999,
            seed: 42,
            mode: ProcessingMode::Parallel,
            deadline: None,
        }
    }
}

/// Result of a completed permutation test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PermutationResult {
    /// Moran's I of the observed labeling
    pub observed: f64,
    /// `(extreme_count + 1) / (permutations + 1)`
    pub p_value: f64,
    pub permutations: usize,
    /// Trials with `|I_perm| >= |I_observed|`
    pub extreme_count: usize,
}

/// Outcome of [`permutation_test`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PermutationOutcome {
    Completed(PermutationResult),
    /// Too few locations carry the trait for the test to mean anything
    NotApplicable { trait_count: usize },
}

impl PermutationOutcome {
    pub fn result(&self) -> Option<&PermutationResult> {
        match self {
            PermutationOutcome::Completed(r) => Some(r),
            PermutationOutcome::NotApplicable { .. } => None,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        self.result().map(|r| r.p_value)
    }
}

/// Permutation test algorithm
#[derive(Debug, Clone, Default)]
pub struct PermutationTest;

impl Algorithm for PermutationTest {
    type Input = (Vec<f64>, SpatialWeights);
    type Output = PermutationOutcome;
    type Params = PermutationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PermutationTest"
    }

    fn description(&self) -> &'static str {
        "Empirical Moran's I p-value from seeded random relabelings"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (values, weights) = input;
        permutation_test(&values, &weights, &params)
    }
}

/// Empirical two-sided p-value for Moran's I under label shuffling.
///
/// Trial `t` shuffles a fresh copy of `values` with
/// `ChaCha8Rng::seed_from_u64(seed)` on stream `t` and recomputes I against
/// the same `weights`. The p-value uses the add-one correction, so it is
/// never zero.
///
/// Locations "carry the trait" when their value is non-zero. With fewer
/// than [`MIN_TRAIT_COUNT`] of them the test returns
/// [`PermutationOutcome::NotApplicable`] without running.
///
/// # Errors
/// - `InvalidParameter` if `permutations == 0` or the worker pool is empty
/// - `LengthMismatch` if `values` and `weights` disagree in size
/// - `Algorithm` if the deadline passes before all trials finish; no
///   partial p-value is returned
pub fn permutation_test(
    values: &[f64],
    weights: &SpatialWeights,
    params: &PermutationParams,
) -> Result<PermutationOutcome> {
    params.validate()?;

    let observed = morans_i_statistic(values, weights)?;

    let trait_count = values.iter().filter(|&&v| v != 0.0).count();
    if trait_count < MIN_TRAIT_COUNT {
        debug!("Permutation test skipped: {} trait locations", trait_count);
        return Ok(PermutationOutcome::NotApplicable { trait_count });
    }

    let start = Instant::now();
    let expired = AtomicBool::new(false);
    let threshold = observed.abs();

    let trials: Vec<Option<bool>> = params.mode.par_map(0..params.permutations, |t| {
        if expired.load(Ordering::Relaxed) {
            return None;
        }
        if let Some(deadline) = params.deadline {
            if start.elapsed() > deadline {
                expired.store(true, Ordering::Relaxed);
                return None;
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        rng.set_stream(t as u64);
        let mut shuffled = values.to_vec();
        shuffled.shuffle(&mut rng);

        // Length and finiteness were checked on the observed labeling
        let permuted = morans_i_statistic(&shuffled, weights).unwrap_or(0.0);
        Some(permuted.abs() >= threshold)
    })?;

    if expired.load(Ordering::Relaxed) || trials.iter().any(Option::is_none) {
        return Err(Error::Algorithm(format!(
            "permutation test exceeded its deadline after {:.2?}",
            start.elapsed()
        )));
    }

    let extreme_count = trials.iter().filter(|t| **t == Some(true)).count();
    let p_value = (extreme_count as f64 + 1.0) / (params.permutations as f64 + 1.0);

    info!(
        "Permutation test: I = {:.4}, {}/{} as extreme, p = {:.4} ({:.2?})",
        observed,
        extreme_count,
        params.permutations,
        p_value,
        start.elapsed()
    );

    Ok(PermutationOutcome::Completed(PermutationResult {
        observed,
        p_value,
        permutations: params.permutations,
        extreme_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn chain(n: usize) -> SpatialWeights {
        let mut raw = Array2::zeros((n, n));
        for i in 0..n - 1 {
            raw[(i, i + 1)] = 1.0;
            raw[(i + 1, i)] = 1.0;
        }
        SpatialWeights::row_standardized(raw).unwrap()
    }

    fn clustered(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i < n / 2 { 1.0 } else { 0.0 }).collect()
    }

    fn params(permutations: usize, seed: u64, mode: ProcessingMode) -> PermutationParams {
        PermutationParams {
            permutations,
            seed,
            mode,
            deadline: None,
        }
    }

    #[test]
    fn test_same_seed_same_p_value() {
        let w = chain(30);
        let x = clustered(30);
        let p = params(199, 7, ProcessingMode::Parallel);
        let a = permutation_test(&x, &w, &p).unwrap();
        let b = permutation_test(&x, &w, &p).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_modes_agree() {
        let w = chain(25);
        let x = clustered(25);
        let seq = permutation_test(&x, &w, &params(150, 11, ProcessingMode::Sequential)).unwrap();
        let par = permutation_test(&x, &w, &params(150, 11, ProcessingMode::Parallel)).unwrap();
        let pool =
            permutation_test(&x, &w, &params(150, 11, ProcessingMode::ParallelWith(3))).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq, pool);
    }

    #[test]
    fn test_clustered_is_significant() {
        let w = chain(40);
        let x = clustered(40);
        let outcome = permutation_test(&x, &w, &params(499, 42, ProcessingMode::Parallel)).unwrap();
        let result = outcome.result().unwrap();
        assert!(result.observed > 0.8);
        assert!(result.p_value < 0.01, "p = {}", result.p_value);
        assert_eq!(result.permutations, 499);
    }

    #[test]
    fn test_p_value_add_one_bounds() {
        let w = chain(12);
        let x = clustered(12);
        let outcome = permutation_test(&x, &w, &params(1, 3, ProcessingMode::Sequential)).unwrap();
        let p = outcome.p_value().unwrap();
        assert!(p == 0.5 || p == 1.0, "with one permutation p is 1/2 or 1, got {p}");
    }

    #[test]
    fn test_constant_values_give_p_one() {
        let w = chain(10);
        let p = params(20, 1, ProcessingMode::Sequential);
        let outcome = permutation_test(&[1.0; 10], &w, &p).unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.observed, 0.0);
        assert_eq!(result.extreme_count, 20);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_not_applicable_below_three_trait_sites() {
        let w = chain(10);
        let mut x = vec![0.0; 10];
        x[0] = 1.0;
        x[5] = 1.0;
        let outcome = permutation_test(&x, &w, &PermutationParams::default()).unwrap();
        assert_eq!(outcome, PermutationOutcome::NotApplicable { trait_count: 2 });
        assert!(outcome.p_value().is_none());
    }

    #[test]
    fn test_zero_permutations_rejected() {
        let w = chain(10);
        let err = permutation_test(&clustered(10), &w, &params(0, 1, ProcessingMode::Sequential));
        assert!(matches!(err, Err(Error::InvalidParameter { name: "permutations", .. })));
    }

    #[test]
    fn test_zero_permutations_rejected_before_applicability() {
        // Too few trait sites to run, but the parameters are still checked
        let w = chain(10);
        let err = permutation_test(&[0.0; 10], &w, &params(0, 1, ProcessingMode::Sequential));
        assert!(matches!(err, Err(Error::InvalidParameter { name: "permutations", .. })));
        assert!(PermutationParams::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let w = chain(10);
        let p = params(10, 1, ProcessingMode::ParallelWith(0));
        let err = permutation_test(&clustered(10), &w, &p);
        assert!(err.is_err());
    }

    #[test]
    fn test_expired_deadline_fails_whole_run() {
        let w = chain(10);
        let p = PermutationParams {
            deadline: Some(Duration::ZERO),
            ..params(100, 1, ProcessingMode::Sequential)
        };
        let err = permutation_test(&clustered(10), &w, &p);
        assert!(matches!(err, Err(Error::Algorithm(_))));
    }
}
