//! Ridge regression on dense feature matrices.
//!
//! The fit goes through the normal equations with a partial-pivot Gaussian
//! solve; the feature count is small and fixed, so a direct dense solve is
//! both simpler and faster than an iterative method. Regularization keeps
//! the system non-singular even with collinear feature columns.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Fitted ridge coefficients for standardized inputs.
#[derive(Debug, Clone)]
pub struct RidgeFit {
    /// One weight per standardized feature column.
    pub weights: Vec<f64>,
    pub intercept: f64,
}

/// Column-wise standardization parameters.
#[derive(Debug, Clone)]
pub struct Standardization {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

/// Compute per-column mean and standard deviation.
///
/// Constant columns get a unit scale so standardization never divides by
/// zero; the column then contributes nothing to the fit.
pub fn column_standardization(x: &ArrayView2<f64>) -> Standardization {
    let n = x.nrows().max(1) as f64;
    let means: Vec<f64> = x
        .axis_iter(Axis(1))
        .map(|col| col.sum() / n)
        .collect();
    let stds: Vec<f64> = x
        .axis_iter(Axis(1))
        .zip(&means)
        .map(|(col, &mean)| {
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if std > 1e-12 {
                std
            } else {
                1.0
            }
        })
        .collect();
    Standardization { means, stds }
}

/// Apply standardization parameters to a feature matrix.
pub fn standardize(x: &ArrayView2<f64>, params: &Standardization) -> Array2<f64> {
    let mut out = x.to_owned();
    for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
        let mean = params.means[j];
        let std = params.stds[j];
        col.mapv_inplace(|v| (v - mean) / std);
    }
    out
}

/// Fit ridge regression on an already-standardized matrix.
///
/// Solves `(XᵀX + λI) w = Xᵀ(y − ȳ)` with the intercept fixed at the target
/// mean, which is exact for centered standardized columns.
pub fn fit_ridge(x: &ArrayView2<f64>, y: &ArrayView1<f64>, lambda: f64) -> RidgeFit {
    let n_features = x.ncols();
    let intercept = y.sum() / y.len().max(1) as f64;
    let centered: Array1<f64> = y.mapv(|v| v - intercept);

    let xt = x.t();
    let mut gram: Array2<f64> = xt.dot(x);
    for j in 0..n_features {
        gram[[j, j]] += lambda * x.nrows().max(1) as f64;
    }
    let rhs: Array1<f64> = xt.dot(&centered);

    let weights = solve_linear_system(gram, rhs)
        .unwrap_or_else(|| Array1::zeros(n_features))
        .to_vec();

    RidgeFit { weights, intercept }
}

/// Evaluate a fit on standardized features.
pub fn predict_row(fit_weights: &[f64], intercept: f64, standardized_row: &[f64]) -> f64 {
    intercept
        + fit_weights
            .iter()
            .zip(standardized_row)
            .map(|(w, v)| w * v)
            .sum::<f64>()
}

/// Dense linear solve via Gaussian elimination with partial pivoting.
///
/// Returns `None` when the matrix is singular to working precision; ridge
/// regularization makes that unreachable in practice for λ > 0.
fn solve_linear_system(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n == 0 || a.ncols() != n || b.len() != n {
        return None;
    }

    for col in 0..n {
        // Pivot on the largest remaining entry in this column.
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                a[[i, col]]
                    .abs()
                    .partial_cmp(&a[[j, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in (row + 1)..n {
            acc -= a[[row, k]] * x[k];
        }
        x[row] = acc / a[[row, row]];
    }
    Some(x)
}

/// Mean absolute error between two equally long series.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Mean squared error between two equally long series.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Population standard deviation of a series.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ridge_recovers_linear_relationship() {
        // y = 3 + 2 * x0 - 1 * x1 with no noise.
        let x = array![
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 4.0],
            [4.0, 2.0],
            [5.0, 5.0],
            [6.0, 1.0],
        ];
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| 3.0 + 2.0 * row[0] - row[1])
            .collect();

        let params = column_standardization(&x.view());
        let xs = standardize(&x.view(), &params);
        let fit = fit_ridge(&xs.view(), &y.view(), 1e-6);

        for (row, &expected) in xs.rows().into_iter().zip(y.iter()) {
            let got = predict_row(&fit.weights, fit.intercept, row.as_slice().unwrap());
            assert!((got - expected).abs() < 1e-3, "got {got}, want {expected}");
        }
    }

    #[test]
    fn test_ridge_handles_constant_column() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0], [4.0, 7.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let params = column_standardization(&x.view());
        assert_eq!(params.stds[1], 1.0);
        let xs = standardize(&x.view(), &params);
        let fit = fit_ridge(&xs.view(), &y.view(), 1e-6);

        let row = xs.row(0);
        let got = predict_row(&fit.weights, fit.intercept, row.as_slice().unwrap());
        assert!((got - 2.0).abs() < 1e-3);
        assert!(fit.weights.iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_error_metrics() {
        let actual = [1.0, 2.0, 3.0];
        let predicted = [2.0, 2.0, 1.0];
        assert!((mean_absolute_error(&actual, &predicted) - 1.0).abs() < 1e-12);
        assert!((mean_squared_error(&actual, &predicted) - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[]), 0.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_system_returns_zero_weights() {
        // Two identical columns with no regularization would be singular;
        // the fit falls back to zero weights instead of NaN.
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let y = array![1.0, 2.0, 3.0];
        let fit = fit_ridge(&x.view(), &y.view(), 0.0);
        assert!(fit.weights.iter().all(|w| w.is_finite()));
    }
}
