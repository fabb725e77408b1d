//! Penalized least squares used by the additive model.
//!
//! Solves `min ||y - X b||² + Σ λ_j b_j²` through the normal equations
//! `(X'X + Λ) b = X'y` with a Cholesky factorization.

use crate::error::{ForecastError, Result};

/// Ridge regression coefficients, one per design column.
#[derive(Debug, Clone)]
pub struct RidgeFit {
    pub coefficients: Vec<f64>,
}

impl RidgeFit {
    /// Predict `X b` for a design given column-major.
    pub fn predict(&self, columns: &[Vec<f64>]) -> Result<Vec<f64>> {
        if columns.len() != self.coefficients.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: columns.len(),
            });
        }

        let n = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut predictions = vec![0.0; n];
        for (column, &coef) in columns.iter().zip(&self.coefficients) {
            if column.len() != n {
                return Err(ForecastError::DimensionMismatch {
                    expected: n,
                    got: column.len(),
                });
            }
            for (pred, x) in predictions.iter_mut().zip(column) {
                *pred += coef * x;
            }
        }

        Ok(predictions)
    }
}

/// Fit `y ≈ X b` with a per-column ridge penalty.
///
/// `columns` holds the design matrix column-major; `penalties[j]` is the
/// penalty on coefficient `j`. A tiny diagonal term keeps the system
/// positive definite when a penalty is zero.
pub fn ridge_fit(y: &[f64], columns: &[Vec<f64>], penalties: &[f64]) -> Result<RidgeFit> {
    let n = y.len();
    if n == 0 {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    if columns.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if penalties.len() != columns.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: columns.len(),
            got: penalties.len(),
        });
    }
    for column in columns {
        if column.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: column.len(),
            });
        }
    }

    let k = columns.len();
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for i in 0..k {
        for j in 0..=i {
            let dot: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = dot;
            xtx[j][i] = dot;
        }
        xty[i] = columns[i].iter().zip(y).map(|(a, b)| a * b).sum();
    }

    for i in 0..k {
        xtx[i][i] += penalties[i].max(0.0) + 1e-8;
    }

    let coefficients = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ForecastError::ComputationError(
            "least squares failed: matrix not positive definite".into(),
        )
    })?;

    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ForecastError::ComputationError(
            "least squares produced non-finite coefficients".into(),
        ));
    }

    Ok(RidgeFit { coefficients })
}

/// Solve symmetric positive definite system using Cholesky decomposition.
///
/// Solves A @ x = b where A is symmetric positive definite.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // Cholesky decomposition A = L @ L'
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
