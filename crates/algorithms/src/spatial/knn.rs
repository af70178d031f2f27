//! k-nearest-neighbor spatial weights
//!
//! Each location is linked to its k closest other locations by great-circle
//! distance. The relation is not symmetric, so the raw matrix generally
//! is not either. Rows are standardized to sum to one.

use ndarray::Array2;
use crate::maybe_rayon::*;
use crate::spatial::distance::haversine_km;
use geomoran_core::{Algorithm, Error, PointSet, Result, SpatialWeights};
use tracing::debug;

/// Distance floor (km) for inverse-distance weights, so coincident
/// points get a large finite weight instead of infinity.
pub const MIN_DISTANCE_KM: f64 = 0.1;

/// How a selected neighbor is weighted before row-standardization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightScheme {
    /// `1 / max(d, MIN_DISTANCE_KM)`
    #[default]
    InverseDistance,
    /// `1` for every neighbor
    Binary,
}

impl WeightScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightScheme::InverseDistance => "inverse-distance",
            WeightScheme::Binary => "binary",
        }
    }
}

/// Parameters for KNN weights construction
#[derive(Debug, Clone)]
pub struct KnnWeightsParams {
    /// Number of neighbors per location (>= 1)
    pub k: usize,
    pub scheme: WeightScheme,
}

impl KnnWeightsParams {
    /// Reject `k == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::invalid_parameter("k", 0, "need at least one neighbor"));
        }
        Ok(())
    }
}

impl Default for KnnWeightsParams {
    fn default() -> Self {
        Self {
            k: 5,
            scheme: WeightScheme::InverseDistance,
        }
    }
}

/// KNN weights algorithm
#[derive(Debug, Clone, Default)]
pub struct KnnWeights;

impl Algorithm for KnnWeights {
    type Input = PointSet;
    type Output = SpatialWeights;
    type Params = KnnWeightsParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "KnnWeights"
    }

    fn description(&self) -> &'static str {
        "Row-standardized k-nearest-neighbor weights from great-circle distances"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        knn_weights(&input, params)
    }
}

/// Build a row-standardized KNN weights matrix.
///
/// For every point `i` the other points are ordered by ascending
/// great-circle distance, ties broken by ascending index, and the first
/// `min(k, n - 1)` become neighbors. With `k >= n - 1` every other point
/// is a neighbor.
///
/// Point sets with fewer than two points give an all-zero matrix, which
/// callers should detect with [`SpatialWeights::is_informative`].
///
/// # Errors
/// `InvalidParameter` if `k == 0`.
pub fn knn_weights(points: &PointSet, params: KnnWeightsParams) -> Result<SpatialWeights> {
    params.validate()?;

    let n = points.len();
    if n < 2 {
        return Ok(SpatialWeights::zeros(n));
    }

    let k = params.k.min(n - 1);
    let pts = points.as_slice();

    let raw: Vec<f64> = (0..n)
        .into_par_iter()
        .flat_map(|i| {
            let mut candidates: Vec<(f64, usize)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (haversine_km(&pts[i], &pts[j]), j))
                .collect();
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let mut row = vec![0.0; n];
            for &(dist, j) in candidates.iter().take(k) {
                row[j] = match params.scheme {
                    WeightScheme::InverseDistance => 1.0 / dist.max(MIN_DISTANCE_KM),
                    WeightScheme::Binary => 1.0,
                };
            }
            row
        })
        .collect();

    let raw = Array2::from_shape_vec((n, n), raw).map_err(|e| Error::Other(e.to_string()))?;
    debug!(
        "Built {}x{} KNN weights (k = {}, {})",
        n,
        n,
        k,
        params.scheme.as_str()
    );
    SpatialWeights::row_standardized(raw)
}
