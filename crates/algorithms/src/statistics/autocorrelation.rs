//! Global spatial autocorrelation
//!
//! Moran's I over an arbitrary spatial weights matrix, with significance
//! under the randomization null (values treated as a fixed set randomly
//! assigned to locations, no normality assumption).
//!
//! Insufficient or degenerate input is not an error: the result is the
//! "no detectable pattern" value `I = 0, z = 0, p = 1` (or the computed I
//! with `z = 0, p = 1` when only the variance is unusable), tagged with a
//! [`Degeneracy`] so reports can tell "not computable" from "computed".

use geomoran_core::{Algorithm, Error, Result, SpatialWeights};
use serde::Serialize;
use std::f64::consts::SQRT_2;
use tracing::debug;

/// Why a result fell back to the trivial value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degeneracy {
    /// Fully computed
    #[default]
    None,
    /// Fewer than 3 locations
    TooFewPoints,
    /// All values identical (zero sum of squared deviations)
    ConstantValues,
    /// Weights matrix carries no weight
    ZeroWeights,
    /// Analytic variance is non-positive or its denominator is zero
    DegenerateVariance,
}

/// Result of Global Moran's I computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoransIResult {
    /// Moran's I statistic
    pub i: f64,
    /// Expected I under the null, `-1 / (n - 1)`
    pub expected: f64,
    /// Variance of I under randomization (0 when not computed)
    pub variance: f64,
    /// Z-score
    pub z_score: f64,
    /// P-value (two-tailed, normal approximation)
    pub p_value: f64,
    pub status: Degeneracy,
}

impl MoransIResult {
    /// The `I = 0, z = 0, p = 1` result for `n` locations.
    pub fn trivial(n: usize, status: Degeneracy) -> Self {
        Self {
            i: 0.0,
            expected: expected_i(n),
            variance: 0.0,
            z_score: 0.0,
            p_value: 1.0,
            status,
        }
    }

    /// Whether the analytic test actually ran
    pub fn is_computable(&self) -> bool {
        self.status == Degeneracy::None
    }
}

/// Moran's I algorithm
#[derive(Debug, Clone, Default)]
pub struct MoransI;

impl Algorithm for MoransI {
    type Input = (Vec<f64>, SpatialWeights);
    type Output = MoransIResult;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "MoransI"
    }

    fn description(&self) -> &'static str {
        "Global Moran's I with randomization-null z-score and p-value"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let (values, weights) = input;
        global_morans_i(&values, &weights)
    }
}

/// `E[I] = -1 / (n - 1)`; 0 when fewer than two locations.
pub fn expected_i(n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        -1.0 / (n as f64 - 1.0)
    }
}

/// Compute Global Moran's I and its randomization-null significance.
///
/// ```text
/// I = (n / S0) · Σ_i Σ_{j≠i} w_ij d_i d_j / Σ_i d_i²
/// ```
///
/// with `d_i = x_i - mean(x)` and `S0` the total weight. Variance follows
/// Cliff & Ord under randomization, using `S1`, `S2` and the sample
/// kurtosis `b2`.
///
/// # Arguments
/// * `values` - One value per location, aligned with the weights rows
/// * `weights` - Spatial weights matrix
///
/// # Errors
/// `LengthMismatch` if `values` and `weights` disagree in size,
/// `InvalidParameter` if a value is not finite.
pub fn global_morans_i(values: &[f64], weights: &SpatialWeights) -> Result<MoransIResult> {
    let stat = match moran_statistic(values, weights)? {
        Statistic::Degenerate(status) => {
            debug!("Moran's I degenerate for n = {}: {:?}", values.len(), status);
            return Ok(MoransIResult::trivial(values.len(), status));
        }
        Statistic::Value(stat) => stat,
    };

    let n = values.len();
    let nf = n as f64;
    let w = weights.data();
    let s0 = stat.w_total;
    let expected = expected_i(n);

    // S1 = ½ Σ_i Σ_j (w_ij + w_ji)²
    let mut s1 = 0.0;
    for i in 0..n {
        for j in 0..n {
            let s = w[(i, j)] + w[(j, i)];
            s1 += s * s;
        }
    }
    s1 /= 2.0;

    // S2 = Σ_i (row_i + col_i)²
    let row_sums = weights.row_sums();
    let col_sums = weights.col_sums();
    let s2: f64 = row_sums
        .iter()
        .zip(&col_sums)
        .map(|(r, c)| (r + c) * (r + c))
        .sum();

    // Sample kurtosis
    let m2 = stat.sum_sq / nf;
    let m4 = stat.deviations.iter().map(|d| d.powi(4)).sum::<f64>() / nf;
    let b2 = m4 / (m2 * m2);

    let a = nf * ((nf * nf - 3.0 * nf + 3.0) * s1 - nf * s2 + 3.0 * s0 * s0);
    let b = b2 * ((nf * nf - nf) * s1 - 2.0 * nf * s2 + 6.0 * s0 * s0);
    let c = (nf - 1.0) * (nf - 2.0) * (nf - 3.0) * s0 * s0;

    if c == 0.0 {
        debug!("Moran's I variance denominator is zero (n = {})", n);
        return Ok(degenerate_variance(stat.i, expected, 0.0));
    }

    let variance = (a - b) / c - expected * expected;
    if !(variance > 0.0) {
        debug!("Moran's I variance non-positive: {}", variance);
        return Ok(degenerate_variance(stat.i, expected, variance));
    }

    let z_score = (stat.i - expected) / variance.sqrt();
    let p_value = two_tailed_p(z_score);

    Ok(MoransIResult {
        i: stat.i,
        expected,
        variance,
        z_score,
        p_value,
        status: Degeneracy::None,
    })
}

/// Moran's I statistic alone, without the variance terms.
///
/// Applies the same degeneracy rules as [`global_morans_i`] and returns
/// `0.0` where that would report the trivial result. Used by the
/// permutation test, where only I changes between relabelings.
pub fn morans_i_statistic(values: &[f64], weights: &SpatialWeights) -> Result<f64> {
    Ok(match moran_statistic(values, weights)? {
        Statistic::Degenerate(_) => 0.0,
        Statistic::Value(stat) => stat.i,
    })
}

/// Standard normal CDF via the error function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / SQRT_2))
}

/// Two-tailed p-value `2 · (1 - Φ(|z|))`.
///
/// Evaluated as `erfc(|z| / √2)`, which is the same quantity without the
/// cancellation in `1 - Φ` for large `|z|`. Floored at the smallest
/// positive double so it never reports exactly zero.
pub fn two_tailed_p(z: f64) -> f64 {
    libm::erfc(z.abs() / SQRT_2).clamp(f64::MIN_POSITIVE, 1.0)
}

fn degenerate_variance(i: f64, expected: f64, variance: f64) -> MoransIResult {
    MoransIResult {
        i,
        expected,
        variance,
        z_score: 0.0,
        p_value: 1.0,
        status: Degeneracy::DegenerateVariance,
    }
}

struct MoranStat {
    i: f64,
    w_total: f64,
    sum_sq: f64,
    deviations: Vec<f64>,
}

enum Statistic {
    Value(MoranStat),
    Degenerate(Degeneracy),
}

fn moran_statistic(values: &[f64], weights: &SpatialWeights) -> Result<Statistic> {
    let n = values.len();
    if weights.n() != n {
        return Err(Error::LengthMismatch {
            expected: weights.n(),
            actual: n,
        });
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(Error::invalid_parameter("values", v, "values must be finite"));
    }

    if n < 3 {
        return Ok(Statistic::Degenerate(Degeneracy::TooFewPoints));
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let deviations: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let sum_sq = deviations.iter().map(|d| d * d).sum::<f64>();
    if sum_sq == 0.0 {
        return Ok(Statistic::Degenerate(Degeneracy::ConstantValues));
    }

    let w = weights.data();
    let mut numerator = 0.0;
    let mut w_total = 0.0;
    for i in 0..n {
        let dev_i = deviations[i];
        for j in 0..n {
            if i != j {
                let wij = w[(i, j)];
                numerator += wij * dev_i * deviations[j];
                w_total += wij;
            }
        }
    }

    if w_total == 0.0 {
        return Ok(Statistic::Degenerate(Degeneracy::ZeroWeights));
    }

    Ok(Statistic::Value(MoranStat {
        i: (nf / w_total) * (numerator / sum_sq),
        w_total,
        sum_sq,
        deviations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    /// Binary rook-style chain 0-1-2-...-(n-1), row-standardized
    fn chain(n: usize) -> SpatialWeights {
        let mut raw = Array2::zeros((n, n));
        for i in 0..n - 1 {
            raw[(i, i + 1)] = 1.0;
            raw[(i + 1, i)] = 1.0;
        }
        SpatialWeights::row_standardized(raw).unwrap()
    }

    #[test]
    fn test_morans_i_uniform() {
        let result = global_morans_i(&[5.0; 10], &chain(10)).unwrap();
        assert_eq!(result.i, 0.0);
        assert_eq!(result.z_score, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.status, Degeneracy::ConstantValues);
        assert_relative_eq!(result.expected, -1.0 / 9.0);
    }

    #[test]
    fn test_morans_i_clustered() {
        let values: Vec<f64> = (0..20).map(|i| if i < 10 { 0.0 } else { 100.0 }).collect();
        let result = global_morans_i(&values, &chain(20)).unwrap();
        assert!(result.i > 0.5, "Clustered data should have high positive I, got {}", result.i);
        assert!(result.z_score > 1.96);
        assert!(result.p_value < 0.05);
        assert!(result.is_computable());
    }

    #[test]
    fn test_morans_i_alternating_is_negative() {
        let values: Vec<f64> = (0..20).map(|i| (i % 2) as f64).collect();
        let result = global_morans_i(&values, &chain(20)).unwrap();
        assert!(result.i < -0.9, "Alternating data should be near -1, got {}", result.i);
        assert!(result.z_score < 0.0);
    }

    #[test]
    fn test_too_few_points() {
        let result = global_morans_i(&[1.0, 0.0], &chain(2)).unwrap();
        assert_eq!((result.i, result.z_score, result.p_value), (0.0, 0.0, 1.0));
        assert_eq!(result.status, Degeneracy::TooFewPoints);
    }

    #[test]
    fn test_zero_weights() {
        let w = SpatialWeights::zeros(4);
        let result = global_morans_i(&[1.0, 0.0, 1.0, 0.0], &w).unwrap();
        assert_eq!((result.i, result.z_score, result.p_value), (0.0, 0.0, 1.0));
        assert_eq!(result.status, Degeneracy::ZeroWeights);
    }

    #[test]
    fn test_three_points_variance_denominator_zero() {
        // (n - 3) = 0 makes the randomization variance undefined
        let result = global_morans_i(&[1.0, 1.0, 0.0], &chain(3)).unwrap();
        assert_eq!(result.status, Degeneracy::DegenerateVariance);
        assert_eq!(result.z_score, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(result.i != 0.0, "I itself is still reported");
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            global_morans_i(&[1.0, 0.0, 1.0], &chain(4)),
            Err(Error::LengthMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        assert!(global_morans_i(&[1.0, f64::NAN, 0.0, 1.0], &chain(4)).is_err());
    }

    #[test]
    fn test_statistic_matches_full_result() {
        let values = [1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let w = chain(8);
        let full = global_morans_i(&values, &w).unwrap();
        assert_eq!(morans_i_statistic(&values, &w).unwrap(), full.i);
    }

    #[test]
    fn test_algorithm_trait() {
        let values: Vec<f64> = (0..6).map(|i| if i < 3 { 1.0 } else { 0.0 }).collect();
        let result = MoransI.execute_default((values, chain(6))).unwrap();
        assert!(result.i > 0.0);
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-3);
    }

    #[test]
    fn test_two_tailed_p() {
        assert_relative_eq!(two_tailed_p(0.0), 1.0);
        assert_relative_eq!(two_tailed_p(1.959_963_984_540_054), 0.05, epsilon = 1e-9);
        assert_relative_eq!(two_tailed_p(-1.959_963_984_540_054), 0.05, epsilon = 1e-9);
        assert!(two_tailed_p(50.0) > 0.0);
    }
}
