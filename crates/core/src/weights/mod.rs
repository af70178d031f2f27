//! Spatial weights matrix

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Row tolerance used when checking row-standardization.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// A square, read-only spatial weights matrix.
///
/// Invariants enforced at construction:
/// - square, sized to the point set it was built from
/// - zero diagonal (no self-weight)
/// - finite, non-negative entries
///
/// Built by the weights builders in `geomoran-algorithms`; downstream
/// statistics only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialWeights {
    data: Array2<f64>,
}

impl SpatialWeights {
    /// All-zero matrix of size `n x n`.
    ///
    /// This is the non-informative matrix returned for point sets with
    /// fewer than two points.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: Array2::zeros((n, n)),
        }
    }

    /// Wrap a raw matrix as-is after checking the invariants.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        validate(&data)?;
        Ok(Self { data })
    }

    /// Check the invariants, then divide every row by its sum.
    ///
    /// Rows summing to zero are left untouched.
    pub fn row_standardized(mut data: Array2<f64>) -> Result<Self> {
        validate(&data)?;
        for mut row in data.axis_iter_mut(Axis(0)) {
            let sum: f64 = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|w| w / sum);
            }
        }
        Ok(Self { data })
    }

    /// Number of locations (rows)
    pub fn n(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Weight `w_ij`, `None` if out of bounds
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.data.get((i, j)).copied()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Sum of each row
    pub fn row_sums(&self) -> Vec<f64> {
        self.data.sum_axis(Axis(1)).to_vec()
    }

    /// Sum of each column
    pub fn col_sums(&self) -> Vec<f64> {
        self.data.sum_axis(Axis(0)).to_vec()
    }

    /// Total weight `S0 = Σ_i Σ_j w_ij`
    pub fn total(&self) -> f64 {
        self.data.sum()
    }

    /// Whether the matrix carries any weight at all.
    ///
    /// Callers should check this before running autocorrelation statistics.
    pub fn is_informative(&self) -> bool {
        self.total() > 0.0
    }

    /// Non-zero entries of row `i` as `(j, w_ij)`, in column order.
    pub fn neighbors(&self, i: usize) -> Vec<(usize, f64)> {
        self.data
            .row(i)
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .map(|(j, &w)| (j, w))
            .collect()
    }

    /// Whether each row with any weight sums to 1 within [`ROW_SUM_TOLERANCE`].
    pub fn is_row_standardized(&self) -> bool {
        self.row_sums()
            .iter()
            .all(|&s| s == 0.0 || (s - 1.0).abs() <= ROW_SUM_TOLERANCE)
    }
}

fn validate(data: &Array2<f64>) -> Result<()> {
    let (rows, cols) = data.dim();
    if rows != cols {
        return Err(Error::LengthMismatch {
            expected: rows,
            actual: cols,
        });
    }
    for ((i, j), &w) in data.indexed_iter() {
        if !w.is_finite() || w < 0.0 {
            return Err(Error::invalid_parameter(
                "weight",
                w,
                format!("entry ({i}, {j}) must be finite and non-negative"),
            ));
        }
        if i == j && w != 0.0 {
            return Err(Error::invalid_parameter(
                "weight",
                w,
                format!("diagonal entry ({i}, {i}) must be zero"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_row_standardized_sums() {
        let raw = array![[0.0, 2.0, 2.0], [1.0, 0.0, 3.0], [0.0, 0.0, 0.0]];
        let w = SpatialWeights::row_standardized(raw).unwrap();
        let sums = w.row_sums();
        assert_relative_eq!(sums[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sums[1], 1.0, epsilon = 1e-12);
        assert_eq!(sums[2], 0.0, "zero rows stay zero");
        assert_relative_eq!(w.get(1, 2).unwrap(), 0.75, epsilon = 1e-12);
        assert!(w.is_row_standardized());
    }

    #[test]
    fn test_rejects_self_weight() {
        let raw = array![[1.0, 0.0], [0.0, 0.0]];
        assert!(SpatialWeights::from_array(raw).is_err());
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(SpatialWeights::from_array(array![[0.0, -1.0], [0.0, 0.0]]).is_err());
        assert!(SpatialWeights::from_array(array![[0.0, f64::NAN], [0.0, 0.0]]).is_err());
    }

    #[test]
    fn test_rejects_non_square() {
        let raw = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            SpatialWeights::from_array(raw),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_zeros_not_informative() {
        let w = SpatialWeights::zeros(1);
        assert_eq!(w.n(), 1);
        assert!(!w.is_informative());
        assert!(w.neighbors(0).is_empty());
    }

    #[test]
    fn test_col_sums_and_neighbors() {
        let w = SpatialWeights::from_array(array![[0.0, 1.0], [0.5, 0.0]]).unwrap();
        assert_eq!(w.col_sums(), vec![0.5, 1.0]);
        assert_eq!(w.neighbors(1), vec![(0, 0.5)]);
        assert_relative_eq!(w.total(), 1.5);
    }
}
